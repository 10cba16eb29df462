//! Application state wiring: store, providers, engine.

use std::sync::Arc;

use quotecache_core::quotes::{EngineConfig, ProviderId, QuoteService, QuoteServiceTrait};
use quotecache_market_data::{ProviderRegistry, ProviderSettings, RetryPolicy};
use quotecache_storage_sqlite::{create_pool, init, run_migrations, spawn_writer, QuoteRepository};

use crate::config::Config;

pub struct AppState {
    pub quote_service: Arc<dyn QuoteServiceTrait>,
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    init(&config.db_path)?;
    let pool = create_pool(&config.db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());
    let store = Arc::new(QuoteRepository::new(pool, writer));

    let registry = Arc::new(ProviderRegistry::new(&ProviderSettings {
        alpha_vantage_api_key: config.alpha_vantage_api_key.clone(),
        polygon_api_key: config.polygon_api_key.clone(),
        retry: RetryPolicy::default(),
    })?);

    let engine_config = EngineConfig {
        default_provider: ProviderId::new(config.default_provider.clone()),
        lookback_years: config.lookback_years,
        ..EngineConfig::default()
    };

    let quote_service: Arc<dyn QuoteServiceTrait> =
        Arc::new(QuoteService::new(store, registry, engine_config));

    Ok(Arc::new(AppState { quote_service }))
}
