//! Quote storage trait.
//!
//! Abstracts the persistence layer so the engine can run against any
//! backend (SQLite in production, an in-memory double in tests).
//!
//! Mutations are async and serialized by the implementation; reads are
//! sync and typically served from a connection pool. Same-key upserts must
//! be linearizable: concurrent writers racing on one
//! `(symbol, day, provider)` leave the row equal to one of the writes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::model::Quote;
use super::types::{Day, ProviderId, Symbol};
use crate::errors::Result;

/// Per-provider aggregate for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCoverage {
    pub provider: String,
    pub quote_count: i64,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub last_fetched_at: DateTime<Utc>,
}

/// Global per-symbol aggregate across all providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolCoverage {
    pub symbol: String,
    pub quote_count: i64,
    /// Distinct providers with at least one row for the symbol.
    pub providers: Vec<String>,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub last_fetched_at: DateTime<Utc>,
}

/// Storage interface for quote data.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Upserts one quote by its `(symbol, day, provider)` key: updates the
    /// existing row's fields and `fetched_at` if the key exists, inserts
    /// otherwise. Exactly one row per key after the call.
    async fn upsert_quote(&self, quote: &Quote) -> Result<Quote>;

    /// Upserts a batch. Returns the number of rows written.
    async fn upsert_quotes(&self, quotes: &[Quote]) -> Result<usize>;

    // =========================================================================
    // Reads
    // =========================================================================

    /// Point lookup by key.
    fn get(&self, symbol: &Symbol, day: Day, provider: &ProviderId) -> Result<Option<Quote>>;

    /// Quotes for one symbol+provider within `[start, end]`, ascending by day.
    fn range(
        &self,
        symbol: &Symbol,
        provider: &ProviderId,
        start: Day,
        end: Day,
    ) -> Result<Vec<Quote>>;

    /// Every provider's row for one symbol on one exact day.
    fn for_day(&self, symbol: &Symbol, day: Day) -> Result<Vec<Quote>>;

    /// Stored row count for a (symbol, provider) pair.
    fn count_for_pair(&self, symbol: &Symbol, provider: &ProviderId) -> Result<i64>;

    /// Full dump, ordered by symbol then day.
    fn dump_all(&self) -> Result<Vec<Quote>>;

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Per-provider aggregates for one symbol. Empty when nothing is stored.
    fn provider_coverage(&self, symbol: &Symbol) -> Result<Vec<ProviderCoverage>>;

    /// Per-symbol aggregates over the whole store, ordered by symbol.
    fn symbol_inventory(&self) -> Result<Vec<SymbolCoverage>>;

    /// Total row count.
    fn total_quotes(&self) -> Result<i64>;

    /// On-disk footprint of the store in bytes.
    fn storage_size_bytes(&self) -> Result<i64>;
}
