//! Market data providers for quotecache.
//!
//! This crate contains everything that talks to an upstream quote source:
//! - [`QuoteProvider`]: the capability trait every provider implements
//! - [`QuoteData`]: the normalized per-day OHLCV record providers emit
//! - [`ProviderRegistry`]: the explicit provider set built at startup
//! - [`MarketDataError`] / [`RetryClass`]: error taxonomy and retry policy
//!
//! The crate knows nothing about persistence. Providers return data or an
//! absence signal; caching decisions live in `quotecache-core`.

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod retry;

pub use errors::{MarketDataError, RetryClass};
pub use models::QuoteData;
pub use provider::QuoteProvider;
pub use provider::{AlphaVantageProvider, PolygonProvider, YahooProvider};
pub use registry::{ProviderRegistry, ProviderSettings};
pub use retry::RetryPolicy;
