//! The quote resolution engine.
//!
//! `QuoteService` resolves a (symbol, day, provider) request through the
//! cache-then-remote path: store lookup, symbol validation, single-day
//! provider fetch, and a bounded backward walk over market-closed days.
//! Cache misses that get filled - and cache hits on thinly covered pairs -
//! opportunistically trigger a fire-and-forget background history refill,
//! bounded to one task per pair by the in-flight set.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Months, NaiveDate};
use log::{debug, info, warn};

use quotecache_market_data::{ProviderRegistry, QuoteProvider};

use super::constants::{
    DEFAULT_LOOKBACK_YEARS, DEFAULT_PROVIDER, DEFAULT_REFILL_THRESHOLD, MAX_FALLBACK_DAYS,
};
use super::diagnostics::{CacheSummary, InflightEntry, ProviderStatus, SymbolSummary};
use super::inflight::InflightSet;
use super::model::{Quote, QuoteRecord, ResolvedQuote};
use super::store::QuoteStore;
use super::types::{Day, ProviderId, Symbol};
use crate::errors::{Error, Result};

// =============================================================================
// Configuration
// =============================================================================

/// Engine configuration, supplied by the composing shell.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Provider used when the caller does not name one.
    pub default_provider: ProviderId,
    /// Years of history fetched by a background refill.
    pub lookback_years: u32,
    /// Stored-row count below which a resolution triggers a refill.
    /// Zero disables background refills entirely.
    pub refill_threshold: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderId::new(DEFAULT_PROVIDER),
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            refill_threshold: DEFAULT_REFILL_THRESHOLD,
        }
    }
}

// =============================================================================
// Service trait (the contract the shells consume)
// =============================================================================

/// Engine-facing contract exposed to the shells (HTTP API, CLI).
#[async_trait]
pub trait QuoteServiceTrait: Send + Sync {
    /// Resolves one day's quote via cache-then-remote-fetch with
    /// market-closed fallback. `Ok(None)` means no trading day was found
    /// within the fallback window - a normal outcome, not an error.
    async fn resolve(
        &self,
        symbol: &str,
        day: NaiveDate,
        provider: Option<&str>,
    ) -> Result<Option<ResolvedQuote>>;

    /// `resolve` for today's date.
    async fn resolve_latest(
        &self,
        symbol: &str,
        provider: Option<&str>,
    ) -> Result<Option<ResolvedQuote>>;

    /// Whatever is already stored for every provider on that exact day.
    /// Read-only cache inspection; triggers no fetch.
    fn resolve_all_providers(&self, symbol: &str, day: NaiveDate) -> Result<Vec<Quote>>;

    /// Stored history for a range, ascending by day.
    fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        provider: Option<&str>,
    ) -> Result<Vec<Quote>>;

    /// Fetches a full range from the provider and stores it. Provider-level
    /// range-fetch failures are downgraded to zero stored; individual
    /// record-write failures are skipped without aborting the batch.
    async fn prefetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        provider: Option<&str>,
    ) -> Result<usize>;

    /// Per-symbol cache summary. `None` when nothing is stored.
    fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolSummary>>;

    /// Global cache summary.
    fn cache_info(&self) -> Result<CacheSummary>;

    /// Full export, ordered by symbol then day.
    fn dump_all(&self) -> Result<Vec<QuoteRecord>>;

    /// Bulk import. Malformed records are skipped, counted and logged;
    /// returns the number of records loaded.
    async fn load_all(&self, records: Vec<QuoteRecord>) -> Result<usize>;
}

// =============================================================================
// Implementation
// =============================================================================

pub struct QuoteService<S: QuoteStore + 'static> {
    store: Arc<S>,
    providers: Arc<ProviderRegistry>,
    inflight: Arc<InflightSet>,
    config: EngineConfig,
}

impl<S: QuoteStore + 'static> QuoteService<S> {
    pub fn new(store: Arc<S>, providers: Arc<ProviderRegistry>, config: EngineConfig) -> Self {
        Self {
            store,
            providers,
            inflight: Arc::new(InflightSet::new()),
            config,
        }
    }

    /// The in-flight refill set, exposed for diagnostics and tests.
    pub fn inflight(&self) -> &InflightSet {
        &self.inflight
    }

    fn provider_id(&self, provider: Option<&str>) -> ProviderId {
        provider
            .map(ProviderId::from)
            .unwrap_or_else(|| self.config.default_provider.clone())
    }

    /// Single-day provider fetch + store write. `Ok(None)` passes the
    /// provider's "no session that day" straight through.
    async fn fetch_and_store(
        &self,
        provider: &Arc<dyn QuoteProvider>,
        symbol: &Symbol,
        day: Day,
    ) -> Result<Option<Quote>> {
        match provider.get_quote(symbol.as_str(), day.date()).await? {
            Some(data) => {
                let quote = Quote::from_provider_data(data, provider.id());
                let stored = self.store.upsert_quote(&quote).await?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    /// Spawns a background history refill for the pair when its stored row
    /// count is below the threshold and no refill is already in flight.
    /// The caller never blocks on the task.
    fn maybe_spawn_refill(&self, symbol: &Symbol, provider_id: &ProviderId) {
        if self.config.refill_threshold <= 0 {
            return;
        }
        let count = match self.store.count_for_pair(symbol, provider_id) {
            Ok(count) => count,
            Err(e) => {
                warn!("refill row-count check for {}/{} failed: {}", symbol, provider_id, e);
                return;
            }
        };
        if count >= self.config.refill_threshold {
            return;
        }
        // Marked in-flight before the task starts; try_begin loses the race
        // if another request already claimed the pair.
        if !self.inflight.try_begin(symbol, provider_id) {
            return;
        }

        let store = self.store.clone();
        let providers = self.providers.clone();
        let inflight = self.inflight.clone();
        let symbol = symbol.clone();
        let provider_id = provider_id.clone();
        let lookback_years = self.config.lookback_years;

        tokio::spawn(async move {
            let end = Day::today();
            let start = Day::new(lookback_start(end.date(), lookback_years));
            debug!(
                "background refill for {}/{} over {}..{}",
                symbol, provider_id, start, end
            );
            match Self::prefetch_into_store(&store, &providers, &symbol, &provider_id, start, end)
                .await
            {
                Ok(stored) => debug!(
                    "background refill for {}/{} stored {} quotes",
                    symbol, provider_id, stored
                ),
                Err(e) => warn!("background refill for {}/{} failed: {}", symbol, provider_id, e),
            }
            // released on success, failure and no-op alike
            inflight.finish(&symbol, &provider_id);
        });
    }

    /// Range fetch + per-record store writes, shared by `prefetch` and the
    /// background refill. A provider-level error during the range fetch is
    /// logged and reported as zero stored; a failed record write skips that
    /// record and continues.
    async fn prefetch_into_store(
        store: &Arc<S>,
        providers: &Arc<ProviderRegistry>,
        symbol: &Symbol,
        provider_id: &ProviderId,
        start: Day,
        end: Day,
    ) -> Result<usize> {
        let provider = providers.get(provider_id.as_str()).map_err(Error::from)?;

        let history = match provider
            .get_history(symbol.as_str(), start.date(), end.date())
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(
                    "range fetch for {}/{} failed: {}; storing nothing",
                    symbol, provider_id, e
                );
                return Ok(0);
            }
        };

        let mut stored = 0usize;
        for data in history {
            let quote = Quote::from_provider_data(data, provider_id.as_str());
            match store.upsert_quote(&quote).await {
                Ok(_) => stored += 1,
                Err(e) => warn!(
                    "skipping quote {}/{} on {}: {}",
                    quote.symbol, quote.provider, quote.day, e
                ),
            }
        }
        Ok(stored)
    }
}

/// Start of the refill window: `years` calendar years before `end`.
fn lookback_start(end: NaiveDate, years: u32) -> NaiveDate {
    end.checked_sub_months(Months::new(years * 12)).unwrap_or(end)
}

#[async_trait]
impl<S: QuoteStore + 'static> QuoteServiceTrait for QuoteService<S> {
    async fn resolve(
        &self,
        symbol: &str,
        day: NaiveDate,
        provider: Option<&str>,
    ) -> Result<Option<ResolvedQuote>> {
        let symbol = Symbol::new(symbol);
        let provider_id = self.provider_id(provider);
        let requested = Day::new(day);

        if let Some(quote) = self.store.get(&symbol, requested, &provider_id)? {
            self.maybe_spawn_refill(&symbol, &provider_id);
            return Ok(Some(ResolvedQuote::new(quote, day)));
        }

        let provider = self.providers.get(provider_id.as_str()).map_err(Error::from)?;

        // Validation must precede every write so an invalid symbol never
        // pollutes the store.
        if !provider.validate_symbol(symbol.as_str()).await? {
            return Err(Error::SymbolNotFound(symbol.to_string()));
        }

        if let Some(quote) = self.fetch_and_store(&provider, &symbol, requested).await? {
            self.maybe_spawn_refill(&symbol, &provider_id);
            return Ok(Some(ResolvedQuote::new(quote, day)));
        }

        // No session on the requested day: walk backward to the most recent
        // prior trading day, bounded by the fallback window.
        for offset in 1..=MAX_FALLBACK_DAYS {
            let earlier = Day::new(day - Duration::days(offset));
            if let Some(quote) = self.store.get(&symbol, earlier, &provider_id)? {
                self.maybe_spawn_refill(&symbol, &provider_id);
                return Ok(Some(ResolvedQuote::new(quote, day)));
            }
            if let Some(quote) = self.fetch_and_store(&provider, &symbol, earlier).await? {
                self.maybe_spawn_refill(&symbol, &provider_id);
                return Ok(Some(ResolvedQuote::new(quote, day)));
            }
        }

        debug!(
            "no trading day for {} within {} days of {}",
            symbol, MAX_FALLBACK_DAYS, day
        );
        Ok(None)
    }

    async fn resolve_latest(
        &self,
        symbol: &str,
        provider: Option<&str>,
    ) -> Result<Option<ResolvedQuote>> {
        self.resolve(symbol, Day::today().date(), provider).await
    }

    fn resolve_all_providers(&self, symbol: &str, day: NaiveDate) -> Result<Vec<Quote>> {
        self.store.for_day(&Symbol::new(symbol), Day::new(day))
    }

    fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        provider: Option<&str>,
    ) -> Result<Vec<Quote>> {
        let provider_id = self.provider_id(provider);
        self.store.range(
            &Symbol::new(symbol),
            &provider_id,
            Day::new(start),
            Day::new(end),
        )
    }

    async fn prefetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        provider: Option<&str>,
    ) -> Result<usize> {
        let symbol = Symbol::new(symbol);
        let provider_id = self.provider_id(provider);
        let stored = Self::prefetch_into_store(
            &self.store,
            &self.providers,
            &symbol,
            &provider_id,
            Day::new(start),
            Day::new(end),
        )
        .await?;
        info!("prefetch stored {} quotes for {}/{}", stored, symbol, provider_id);
        Ok(stored)
    }

    fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolSummary>> {
        let symbol = Symbol::new(symbol);
        let coverage = self.store.provider_coverage(&symbol)?;
        Ok(SymbolSummary::from_coverage(symbol.as_str(), coverage))
    }

    fn cache_info(&self) -> Result<CacheSummary> {
        let symbols = self.store.symbol_inventory()?;
        let providers = self
            .providers
            .readiness()
            .into_iter()
            .map(|(id, configured)| ProviderStatus { id, configured })
            .collect();
        let inflight = self
            .inflight
            .snapshot()
            .into_iter()
            .map(|(symbol, provider)| InflightEntry { symbol, provider })
            .collect();

        Ok(CacheSummary {
            total_quotes: self.store.total_quotes()?,
            symbol_count: symbols.len() as i64,
            storage_size_bytes: self.store.storage_size_bytes()?,
            symbols,
            providers,
            inflight,
        })
    }

    fn dump_all(&self) -> Result<Vec<QuoteRecord>> {
        let quotes = self.store.dump_all()?;
        Ok(quotes.iter().map(QuoteRecord::from).collect())
    }

    async fn load_all(&self, records: Vec<QuoteRecord>) -> Result<usize> {
        let total = records.len();
        let mut quotes = Vec::with_capacity(total);
        let mut skipped = 0usize;
        for record in records {
            match record.into_quote() {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    skipped += 1;
                    warn!("{}", e);
                }
            }
        }

        let loaded = self.store.upsert_quotes(&quotes).await?;
        if skipped > 0 {
            warn!("skipped {} of {} records during load", skipped, total);
        }
        info!("loaded {} quotes", loaded);
        Ok(loaded)
    }
}
