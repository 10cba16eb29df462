//! Read-only summary views over the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::store::{ProviderCoverage, SymbolCoverage};

/// Configuration readiness of one registered provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub id: String,
    pub configured: bool,
}

/// A background refill currently in flight, for observability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflightEntry {
    pub symbol: String,
    pub provider: String,
}

/// Per-symbol cache summary: per-provider coverage aggregated into an
/// overall date range and total count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub total_quotes: i64,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub last_fetched_at: DateTime<Utc>,
    pub providers: Vec<ProviderCoverage>,
}

impl SymbolSummary {
    /// Aggregates per-provider coverage rows. `None` when the symbol has no
    /// stored rows at all.
    pub fn from_coverage(symbol: &str, providers: Vec<ProviderCoverage>) -> Option<Self> {
        let first = providers.iter().map(|c| c.first_day).min()?;
        let last = providers.iter().map(|c| c.last_day).max()?;
        let fetched = providers.iter().map(|c| c.last_fetched_at).max()?;
        Some(Self {
            symbol: symbol.to_string(),
            total_quotes: providers.iter().map(|c| c.quote_count).sum(),
            first_day: first,
            last_day: last,
            last_fetched_at: fetched,
            providers,
        })
    }
}

/// Global cache summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSummary {
    pub total_quotes: i64,
    pub symbol_count: i64,
    pub storage_size_bytes: i64,
    pub symbols: Vec<SymbolCoverage>,
    pub providers: Vec<ProviderStatus>,
    pub inflight: Vec<InflightEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn coverage(provider: &str, count: i64, first: &str, last: &str) -> ProviderCoverage {
        ProviderCoverage {
            provider: provider.to_string(),
            quote_count: count,
            first_day: NaiveDate::parse_from_str(first, "%Y-%m-%d").unwrap(),
            last_day: NaiveDate::parse_from_str(last, "%Y-%m-%d").unwrap(),
            last_fetched_at: Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn symbol_summary_aggregates_across_providers() {
        let summary = SymbolSummary::from_coverage(
            "AAPL",
            vec![
                coverage("yahoo", 10, "2026-01-05", "2026-02-13"),
                coverage("polygon", 4, "2025-12-01", "2026-02-10"),
            ],
        )
        .unwrap();

        assert_eq!(summary.total_quotes, 14);
        assert_eq!(
            summary.first_day,
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()
        );
        assert_eq!(
            summary.last_day,
            NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()
        );
        assert_eq!(summary.providers.len(), 2);
    }

    #[test]
    fn empty_coverage_yields_no_summary() {
        assert!(SymbolSummary::from_coverage("AAPL", Vec::new()).is_none());
    }
}
