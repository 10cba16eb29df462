//! Core error types.

use thiserror::Error;

use quotecache_market_data::MarketDataError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the quote engine.
///
/// "No data" is never an error: resolution returns `Ok(None)` for
/// market-closed days and unknown dates. Errors are reserved for invalid
/// symbols, configuration problems, exhausted retries and storage failures.
#[derive(Error, Debug)]
pub enum Error {
    /// The symbol failed provider existence validation.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// No provider is registered under the requested name.
    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    /// The requested provider is missing its credentials.
    #[error("Provider '{0}' is not configured")]
    ProviderNotConfigured(String),

    /// A provider call failed after exhausting its retry schedule.
    #[error("Market data operation failed: {0}")]
    MarketData(MarketDataError),

    /// A storage operation failed.
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<MarketDataError> for Error {
    fn from(error: MarketDataError) -> Self {
        match error {
            MarketDataError::SymbolNotFound(symbol) => Error::SymbolNotFound(symbol),
            MarketDataError::UnknownProvider(provider) => Error::UnknownProvider(provider),
            MarketDataError::NotConfigured { provider } => Error::ProviderNotConfigured(provider),
            other => Error::MarketData(other),
        }
    }
}

/// Database errors, expressed without any storage-engine types so the core
/// crate stays backend-agnostic. The storage crate converts its own error
/// types into these at the boundary.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}
