pub mod constants;
pub mod diagnostics;
pub mod inflight;
pub mod model;
pub mod service;
pub mod store;
pub mod types;


// Re-export the public interface
pub use diagnostics::{CacheSummary, InflightEntry, ProviderStatus, SymbolSummary};
pub use inflight::InflightSet;
pub use model::{MalformedRecord, Quote, QuoteRecord, ResolvedQuote};
pub use service::{EngineConfig, QuoteService, QuoteServiceTrait};
pub use store::{ProviderCoverage, QuoteStore, SymbolCoverage};
pub use types::{quote_id, Day, ProviderId, Symbol};
