//! Quote domain models and the dump/load wire record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use quotecache_market_data::QuoteData;

use crate::validation::is_valid_symbol_format;

// =============================================================================
// Quote
// =============================================================================

/// One day of OHLCV data for one symbol from one provider, as persisted.
///
/// At most one row exists per `(symbol, day, provider)`; a write with a
/// matching key updates the row in place and refreshes `fetched_at`.
/// Prices and volume are nullable - providers omit fields for thinly traded
/// instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    #[serde(rename = "date")]
    pub day: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    /// Whether the prices reflect splits and dividends.
    pub adjusted: bool,
    pub provider: String,
    /// UTC timestamp of the last write for this key.
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    /// Builds a persistable quote from provider output, stamping the fetch
    /// time with the current instant.
    pub fn from_provider_data(data: QuoteData, provider: &str) -> Self {
        Self {
            symbol: data.symbol,
            day: data.day,
            open: data.open,
            high: data.high,
            low: data.low,
            close: data.close,
            volume: data.volume,
            adjusted: data.adjusted,
            provider: provider.to_string(),
            fetched_at: Utc::now(),
        }
    }
}

// =============================================================================
// ResolvedQuote
// =============================================================================

/// A quote returned from resolution, annotated with the day the caller
/// asked for.
///
/// After a market-closed fallback the two dates differ: `quote.day` is the
/// trading day the data belongs to, `requested_date` is the day of the
/// original request (a weekend or holiday).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedQuote {
    #[serde(flatten)]
    pub quote: Quote,
    pub requested_date: NaiveDate,
}

impl ResolvedQuote {
    pub fn new(quote: Quote, requested_date: NaiveDate) -> Self {
        Self {
            quote,
            requested_date,
        }
    }

    /// True when the quote came from an earlier trading day than requested.
    pub fn is_fallback(&self) -> bool {
        self.quote.day != self.requested_date
    }
}

// =============================================================================
// QuoteRecord (dump/load wire format)
// =============================================================================

/// External record shape for bulk dump/load, stable across round trips.
///
/// Dates are plain strings here so a malformed record surfaces as a
/// validation failure (skip + count) instead of aborting deserialization
/// of the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub symbol: String,
    pub date: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    // Dumps written before the adjusted column existed omit the field.
    #[serde(default = "default_adjusted")]
    pub adjusted: bool,
    pub provider: String,
    pub fetched_at: String,
}

fn default_adjusted() -> bool {
    true
}

/// A record that failed bulk-load validation. Skipped and counted, never
/// fatal to the batch.
#[derive(Error, Debug)]
#[error("malformed record: {0}")]
pub struct MalformedRecord(String);

impl QuoteRecord {
    /// Validates the record and converts it into a domain quote.
    pub fn into_quote(self) -> Result<Quote, MalformedRecord> {
        if !is_valid_symbol_format(&self.symbol) {
            return Err(MalformedRecord(format!("bad symbol '{}'", self.symbol)));
        }
        if self.provider.is_empty() {
            return Err(MalformedRecord(format!(
                "missing provider for '{}'",
                self.symbol
            )));
        }
        let day = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| MalformedRecord(format!("bad date '{}'", self.date)))?;
        let fetched_at = DateTime::parse_from_rfc3339(&self.fetched_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| MalformedRecord(format!("bad fetched_at '{}'", self.fetched_at)))?;

        Ok(Quote {
            symbol: self.symbol.to_uppercase(),
            day,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            adjusted: self.adjusted,
            provider: self.provider,
            fetched_at,
        })
    }
}

impl From<&Quote> for QuoteRecord {
    fn from(quote: &Quote) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            date: quote.day.format("%Y-%m-%d").to_string(),
            open: quote.open,
            high: quote.high,
            low: quote.low,
            close: quote.close,
            volume: quote.volume,
            adjusted: quote.adjusted,
            provider: quote.provider.clone(),
            fetched_at: quote.fetched_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_quote() -> Quote {
        Quote {
            symbol: "AAPL".to_string(),
            day: NaiveDate::from_ymd_opt(2026, 2, 13).unwrap(),
            open: Some(230.1),
            high: Some(233.0),
            low: Some(229.55),
            close: Some(232.47),
            volume: Some(51_230_400.0),
            adjusted: true,
            provider: "yahoo".to_string(),
            fetched_at: Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn resolved_quote_serializes_flat_with_requested_date() {
        let resolved = ResolvedQuote::new(
            sample_quote(),
            NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
        );
        assert!(resolved.is_fallback());

        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["date"], "2026-02-13");
        assert_eq!(json["requested_date"], "2026-02-16");
        assert_eq!(json["provider"], "yahoo");
    }

    #[test]
    fn record_round_trips_through_quote() {
        let quote = sample_quote();
        let record = QuoteRecord::from(&quote);
        assert_eq!(record.date, "2026-02-13");
        let back = record.into_quote().unwrap();
        assert_eq!(back, quote);
    }

    #[test]
    fn record_without_adjusted_defaults_to_true() {
        let json = r#"{
            "symbol": "MSFT",
            "date": "2026-02-13",
            "open": 420.0, "high": 425.0, "low": 418.0, "close": 424.2,
            "volume": 1000.0,
            "provider": "yahoo",
            "fetched_at": "2026-02-14T09:30:00+00:00"
        }"#;
        let record: QuoteRecord = serde_json::from_str(json).unwrap();
        assert!(record.into_quote().unwrap().adjusted);
    }

    #[test]
    fn malformed_records_are_rejected() {
        let mut record = QuoteRecord::from(&sample_quote());
        record.date = "13/02/2026".to_string();
        assert!(record.into_quote().is_err());

        let mut record = QuoteRecord::from(&sample_quote());
        record.symbol = "NOT A SYMBOL".to_string();
        assert!(record.into_quote().is_err());

        let mut record = QuoteRecord::from(&sample_quote());
        record.fetched_at = "yesterday".to_string();
        assert!(record.into_quote().is_err());

        let mut record = QuoteRecord::from(&sample_quote());
        record.provider = String::new();
        assert!(record.into_quote().is_err());
    }
}
