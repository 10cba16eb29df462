//! Error types and retry classification for provider operations.

use thiserror::Error;

/// Errors that can occur while talking to an upstream quote provider.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which determines whether the fixed
/// backoff schedule applies before the error is surfaced.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider does not know the requested symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider requires credentials that are not present.
    /// Terminal for the call; configuration problems are not retried.
    #[error("Provider '{provider}' is not configured (missing API key)")]
    NotConfigured { provider: String },

    /// The provider rate limited the request (HTTP 429 or a vendor-specific
    /// rate-limit response body).
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// The provider returned an error response.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// The provider returned a payload we could not decode.
    #[error("Parse error: {provider} - {message}")]
    ParseError { provider: String, message: String },

    /// No provider is registered under the requested name.
    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    /// A transport-level error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// How a failed provider call should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Terminal - retrying will not help.
    Never,
    /// Transient - retry on the fixed backoff schedule.
    WithBackoff,
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// Rate limits, timeouts and transport failures are transient and go
    /// through the backoff schedule; everything else is terminal.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Network(_) => {
                RetryClass::WithBackoff
            }
            Self::SymbolNotFound(_)
            | Self::NotConfigured { .. }
            | Self::ProviderError { .. }
            | Self::ParseError { .. }
            | Self::UnknownProvider(_) => RetryClass::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_retries_with_backoff() {
        let error = MarketDataError::RateLimited {
            provider: "alpha_vantage".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn timeout_retries_with_backoff() {
        let error = MarketDataError::Timeout {
            provider: "polygon".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn symbol_not_found_never_retries() {
        let error = MarketDataError::SymbolNotFound("NOPE".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn not_configured_never_retries() {
        let error = MarketDataError::NotConfigured {
            provider: "polygon".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn error_display() {
        let error = MarketDataError::ProviderError {
            provider: "alpha_vantage".to_string(),
            message: "API key invalid".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider error: alpha_vantage - API key invalid"
        );
    }
}
