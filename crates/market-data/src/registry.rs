//! Explicit provider registry.
//!
//! The registry is an ordinary value constructed once at startup from
//! [`ProviderSettings`] and injected into whatever needs providers. There is
//! no process-global state; tests build a registry around their own doubles
//! with [`ProviderRegistry::from_providers`].

use std::collections::HashMap;
use std::sync::Arc;

use log::info;

use crate::errors::MarketDataError;
use crate::provider::{AlphaVantageProvider, PolygonProvider, QuoteProvider, YahooProvider};
use crate::retry::RetryPolicy;

/// Credentials and tuning supplied by the composing shell.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub alpha_vantage_api_key: Option<String>,
    pub polygon_api_key: Option<String>,
    pub retry: RetryPolicy,
}

pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn QuoteProvider>>,
    ordered_ids: Vec<String>,
}

impl ProviderRegistry {
    /// Builds the standard provider set. Providers missing credentials are
    /// still registered; they report unconfigured and fail loudly when
    /// asked for data.
    pub fn new(settings: &ProviderSettings) -> Result<Self, MarketDataError> {
        let registry = Self::from_providers(vec![
            Arc::new(YahooProvider::new()?) as Arc<dyn QuoteProvider>,
            Arc::new(AlphaVantageProvider::new(
                settings.alpha_vantage_api_key.clone(),
                settings.retry.clone(),
            )) as Arc<dyn QuoteProvider>,
            Arc::new(PolygonProvider::new(
                settings.polygon_api_key.clone(),
                settings.retry.clone(),
            )) as Arc<dyn QuoteProvider>,
        ]);

        for (id, configured) in registry.readiness() {
            info!(
                "registered provider '{}' ({})",
                id,
                if configured { "ready" } else { "needs API key" }
            );
        }
        Ok(registry)
    }

    /// Builds a registry from an explicit provider list, preserving order.
    /// This is the injection seam for test doubles.
    pub fn from_providers(providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        let mut map = HashMap::new();
        let mut ordered_ids = Vec::new();
        for provider in providers {
            let id = provider.id().to_string();
            if map.insert(id.clone(), provider).is_none() {
                ordered_ids.push(id);
            }
        }
        Self {
            providers: map,
            ordered_ids,
        }
    }

    /// Looks up a provider by name.
    pub fn get(&self, id: &str) -> Result<Arc<dyn QuoteProvider>, MarketDataError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| MarketDataError::UnknownProvider(id.to_string()))
    }

    /// Provider names in registration order.
    pub fn ids(&self) -> &[String] {
        &self.ordered_ids
    }

    /// Providers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn QuoteProvider>> {
        self.ordered_ids
            .iter()
            .filter_map(|id| self.providers.get(id))
    }

    /// (id, is_configured) pairs in registration order.
    pub fn readiness(&self) -> Vec<(String, bool)> {
        self.iter()
            .map(|p| (p.id().to_string(), p.is_configured()))
            .collect()
    }
}
