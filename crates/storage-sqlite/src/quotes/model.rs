//! Database model for quotes.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use quotecache_core::quotes::{quote_id, Day, ProviderId, Quote, Symbol};

/// Database row for the `quotes` table.
///
/// `day` is stored as `YYYY-MM-DD` text and `fetched_at` as RFC 3339 text;
/// both orderings are lexicographic, which the range and aggregate queries
/// rely on. Field order matches the column order after migrations
/// (`adjusted` was added later, so it comes last).
#[derive(
    Queryable,
    Identifiable,
    Selectable,
    Insertable,
    AsChangeset,
    QueryableByName,
    Debug,
    Clone,
    PartialEq,
)]
#[diesel(table_name = crate::schema::quotes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuoteDB {
    pub id: String,
    pub symbol: String,
    pub day: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub provider: String,
    pub fetched_at: String,
    pub adjusted: bool,
}

pub(crate) fn parse_day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl From<QuoteDB> for Quote {
    fn from(db: QuoteDB) -> Self {
        Quote {
            symbol: db.symbol,
            day: parse_day(&db.day),
            open: db.open,
            high: db.high,
            low: db.low,
            close: db.close,
            volume: db.volume,
            adjusted: db.adjusted,
            provider: db.provider,
            fetched_at: parse_datetime(&db.fetched_at),
        }
    }
}

impl From<&Quote> for QuoteDB {
    fn from(quote: &Quote) -> Self {
        let id = quote_id(
            &Symbol::new(&quote.symbol),
            Day::new(quote.day),
            &ProviderId::new(quote.provider.clone()),
        );
        QuoteDB {
            id,
            symbol: quote.symbol.clone(),
            day: quote.day.format("%Y-%m-%d").to_string(),
            open: quote.open,
            high: quote.high,
            low: quote.low,
            close: quote.close,
            volume: quote.volume,
            provider: quote.provider.clone(),
            fetched_at: quote.fetched_at.to_rfc3339(),
            adjusted: quote.adjusted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quote_round_trips_through_the_db_row() {
        let quote = Quote {
            symbol: "AAPL".to_string(),
            day: NaiveDate::from_ymd_opt(2026, 2, 13).unwrap(),
            open: Some(230.1),
            high: None,
            low: Some(229.55),
            close: Some(232.47),
            volume: Some(51_230_400.0),
            adjusted: false,
            provider: "alpha_vantage".to_string(),
            fetched_at: Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).unwrap(),
        };

        let row = QuoteDB::from(&quote);
        assert_eq!(row.id, "AAPL_2026-02-13_alpha_vantage");
        assert_eq!(row.day, "2026-02-13");

        let back = Quote::from(row);
        assert_eq!(back, quote);
    }
}
