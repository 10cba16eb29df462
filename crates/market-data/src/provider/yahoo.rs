//! Yahoo Finance provider.
//!
//! Uses the `yahoo_finance_api` connector. Needs no credentials, which makes
//! it the default provider for fresh installations.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::warn;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::QuoteData;
use crate::provider::QuoteProvider;

pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

impl YahooProvider {
    pub const ID: &'static str = "yahoo";

    pub fn new() -> Result<Self, MarketDataError> {
        let connector = yahoo::YahooConnector::new().map_err(|e| MarketDataError::ProviderError {
            provider: Self::ID.to_string(),
            message: format!("failed to initialize connector: {}", e),
        })?;
        Ok(Self { connector })
    }

    fn to_offset_datetime(dt: DateTime<Utc>) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(dt.timestamp())
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
    }

    /// Bounds for a history request covering `[start, end]` whole days.
    fn range_bounds(start: NaiveDate, end: NaiveDate) -> (OffsetDateTime, OffsetDateTime) {
        let start_dt = start.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end_dt = (end + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap().and_utc();
        (
            Self::to_offset_datetime(start_dt),
            Self::to_offset_datetime(end_dt),
        )
    }

    fn bar_to_quote_data(symbol: &str, bar: &yahoo::Quote) -> Option<QuoteData> {
        let day = DateTime::from_timestamp(bar.timestamp as i64, 0)?.date_naive();
        Some(QuoteData::new(
            symbol,
            day,
            Some(bar.open),
            Some(bar.high),
            Some(bar.low),
            Some(bar.close),
            Some(bar.volume as f64),
            true,
        ))
    }

    fn map_error(symbol: &str, error: yahoo::YahooError) -> MarketDataError {
        match error {
            yahoo::YahooError::FetchFailed(e) => MarketDataError::ProviderError {
                provider: Self::ID.to_string(),
                message: format!("fetch failed for {}: {}", symbol, e),
            },
            other => MarketDataError::ProviderError {
                provider: Self::ID.to_string(),
                message: other.to_string(),
            },
        }
    }

    async fn fetch_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<QuoteData>, MarketDataError> {
        let (start_time, end_time) = Self::range_bounds(start, end);

        let response = match self
            .connector
            .get_quote_history(symbol, start_time, end_time)
            .await
        {
            Ok(response) => response,
            Err(yahoo::YahooError::NoQuotes) | Err(yahoo::YahooError::NoResult) => {
                return Ok(Vec::new())
            }
            Err(e) => return Err(Self::map_error(symbol, e)),
        };

        let bars = match response.quotes() {
            Ok(bars) => bars,
            Err(yahoo::YahooError::NoQuotes) | Err(yahoo::YahooError::NoResult) => {
                return Ok(Vec::new())
            }
            Err(e) => return Err(Self::map_error(symbol, e)),
        };

        let mut quotes: Vec<QuoteData> = bars
            .iter()
            .filter_map(|bar| Self::bar_to_quote_data(symbol, bar))
            .collect();
        quotes.sort_by_key(|q| q.day);
        Ok(quotes)
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn get_quote(
        &self,
        symbol: &str,
        day: NaiveDate,
    ) -> Result<Option<QuoteData>, MarketDataError> {
        let quotes = self.fetch_range(symbol, day, day).await?;
        Ok(quotes.into_iter().find(|q| q.day == day))
    }

    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<QuoteData>, MarketDataError> {
        self.fetch_range(symbol, start, end).await
    }

    /// Best-effort existence check via ticker search.
    ///
    /// Fails open: when the search call itself errors, the symbol is
    /// reported valid so an upstream outage degrades lookups instead of
    /// rejecting every symbol. A `true` from this provider is therefore
    /// weaker evidence than a `true` from the keyed providers.
    async fn validate_symbol(&self, symbol: &str) -> Result<bool, MarketDataError> {
        match self.connector.search_ticker(symbol).await {
            Ok(result) => Ok(result
                .quotes
                .iter()
                .any(|item| item.symbol.eq_ignore_ascii_case(symbol))),
            Err(e) => {
                warn!(
                    "yahoo symbol validation for '{}' failed ({}); assuming valid",
                    symbol, e
                );
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_cover_the_whole_end_day() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 13).unwrap();
        let (from, to) = YahooProvider::range_bounds(start, end);
        assert_eq!(from.unix_timestamp(), 1_770_595_200); // 2026-02-09T00:00:00Z
        assert_eq!(to.unix_timestamp() - from.unix_timestamp(), 5 * 86_400);
    }
}
