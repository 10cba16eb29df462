//! Quote provider trait definition.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::MarketDataError;
use crate::models::QuoteData;

/// Capability trait for an upstream quote source.
///
/// Implement this trait to add support for a new data source. The contract
/// distinguishes "the market had no session / the provider has no data"
/// (`Ok(None)` / an empty vector) from real failures (`Err`): the caching
/// layer treats absence as a normal outcome and walks back to the previous
/// trading day, while errors are surfaced or retried.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Stable identifier for this provider ("yahoo", "alpha_vantage", ...).
    /// Stored alongside every quote it produced.
    fn id(&self) -> &'static str;

    /// Whether the required credentials are present.
    ///
    /// Unconfigured providers must fail loudly with
    /// [`MarketDataError::NotConfigured`] on every data call rather than
    /// silently returning empty results.
    fn is_configured(&self) -> bool {
        true
    }

    /// Fetch a single day's OHLCV.
    ///
    /// Returns `Ok(None)` when the market had no session that day or the
    /// upstream has no data for it.
    async fn get_quote(
        &self,
        symbol: &str,
        day: NaiveDate,
    ) -> Result<Option<QuoteData>, MarketDataError>;

    /// Fetch daily OHLCV for a date range (inclusive), ascending by day.
    /// Each call re-fetches; an empty vector means no data in the range.
    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<QuoteData>, MarketDataError>;

    /// Best-effort check that the symbol exists at this provider.
    async fn validate_symbol(&self, symbol: &str) -> Result<bool, MarketDataError>;
}
