//! Server configuration from environment variables (`.env` supported).

use quotecache_core::quotes::constants::{DEFAULT_LOOKBACK_YEARS, DEFAULT_PROVIDER};

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub db_path: String,
    pub default_provider: String,
    pub lookback_years: u32,
    pub alpha_vantage_api_key: Option<String>,
    pub polygon_api_key: Option<String>,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            listen_addr: env_opt("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            db_path: env_opt("QUOTECACHE_DB")
                .unwrap_or_else(|| "instance/quotes.db".to_string()),
            default_provider: env_opt("DEFAULT_PROVIDER")
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            lookback_years: env_opt("PREFETCH_LOOKBACK_YEARS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LOOKBACK_YEARS),
            alpha_vantage_api_key: env_opt("ALPHA_VANTAGE_API_KEY"),
            polygon_api_key: env_opt("POLYGON_API_KEY"),
        }
    }
}
