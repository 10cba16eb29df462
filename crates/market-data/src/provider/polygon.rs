//! Polygon.io provider.
//!
//! Single-day quotes come from the daily open/close endpoint, history from
//! the aggregates endpoint with `next_url` pagination. All requests carry
//! bearer-token auth; HTTP 429 goes through the backoff schedule.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::QuoteData;
use crate::provider::QuoteProvider;
use crate::retry::{with_backoff, RetryPolicy};

const BASE_URL: &str = "https://api.polygon.io";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const AGGS_PAGE_LIMIT: u32 = 50_000;

pub struct PolygonProvider {
    client: Client,
    api_key: Option<String>,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct DailyOpenClose {
    status: Option<String>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AggsResponse {
    #[serde(default)]
    results: Vec<AggBar>,
    next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggBar {
    /// Bar timestamp in Unix milliseconds.
    t: i64,
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    c: Option<f64>,
    v: Option<f64>,
}

impl PolygonProvider {
    pub const ID: &'static str = "polygon";

    pub fn new(api_key: Option<String>, retry: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            api_key,
            retry,
        }
    }

    fn require_key(&self) -> Result<&str, MarketDataError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| MarketDataError::NotConfigured {
                provider: Self::ID.to_string(),
            })
    }

    /// GET with auth, mapping 429 to the retryable rate-limit error and any
    /// other non-success status to a provider error. 404 is handed back to
    /// the caller: for quote endpoints it means "no data", not a failure.
    async fn get_raw(
        &self,
        url: &str,
        key: &str,
    ) -> Result<Option<reqwest::Response>, MarketDataError> {
        let response = self.client.get(url).bearer_auth(key).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::TOO_MANY_REQUESTS => Err(MarketDataError::RateLimited {
                provider: Self::ID.to_string(),
            }),
            status if status.is_success() => Ok(Some(response)),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MarketDataError::ProviderError {
                    provider: Self::ID.to_string(),
                    message: format!("{}: {}", status, body),
                })
            }
        }
    }

    async fn fetch_open_close(
        &self,
        url: &str,
        key: &str,
    ) -> Result<Option<DailyOpenClose>, MarketDataError> {
        match self.get_raw(url, key).await? {
            None => Ok(None),
            Some(response) => {
                let data: DailyOpenClose = response.json().await?;
                Ok(Some(data))
            }
        }
    }

    async fn fetch_aggs_page(
        &self,
        url: &str,
        key: &str,
    ) -> Result<AggsResponse, MarketDataError> {
        match self.get_raw(url, key).await? {
            None => Ok(AggsResponse {
                results: Vec::new(),
                next_url: None,
            }),
            Some(response) => Ok(response.json().await?),
        }
    }

    fn bar_to_quote_data(symbol: &str, bar: &AggBar) -> Option<QuoteData> {
        let day = DateTime::from_timestamp_millis(bar.t)?.date_naive();
        Some(QuoteData::new(
            symbol, day, bar.o, bar.h, bar.l, bar.c, bar.v, true,
        ))
    }
}

#[async_trait]
impl QuoteProvider for PolygonProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    async fn get_quote(
        &self,
        symbol: &str,
        day: NaiveDate,
    ) -> Result<Option<QuoteData>, MarketDataError> {
        let key = self.require_key()?;
        let url = format!(
            "{}/v1/open-close/{}/{}?adjusted=true",
            BASE_URL,
            symbol.to_uppercase(),
            day.format("%Y-%m-%d")
        );
        let data = with_backoff(&self.retry, "polygon open-close", || {
            self.fetch_open_close(&url, key)
        })
        .await?;

        let Some(data) = data else { return Ok(None) };
        if data.status.as_deref() == Some("NOT_FOUND") {
            return Ok(None);
        }
        Ok(Some(QuoteData::new(
            symbol,
            day,
            data.open,
            data.high,
            data.low,
            data.close,
            data.volume,
            true,
        )))
    }

    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<QuoteData>, MarketDataError> {
        let key = self.require_key()?;
        let mut url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}?adjusted=true&sort=asc&limit={}",
            BASE_URL,
            symbol.to_uppercase(),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            AGGS_PAGE_LIMIT
        );

        let mut quotes = Vec::new();
        loop {
            let page = with_backoff(&self.retry, "polygon aggregates", || {
                self.fetch_aggs_page(&url, key)
            })
            .await?;

            quotes.extend(
                page.results
                    .iter()
                    .filter_map(|bar| Self::bar_to_quote_data(symbol, bar)),
            );

            match page.next_url {
                Some(next) => url = next,
                None => break,
            }
        }
        Ok(quotes)
    }

    async fn validate_symbol(&self, symbol: &str) -> Result<bool, MarketDataError> {
        let key = self.require_key()?;
        let url = format!(
            "{}/v3/reference/tickers/{}",
            BASE_URL,
            symbol.to_uppercase()
        );
        let response = with_backoff(&self.retry, "polygon ticker reference", || {
            self.get_raw(&url, key)
        })
        .await?;
        Ok(response.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agg_bar_timestamp_maps_to_calendar_day() {
        let bar = AggBar {
            t: 1_770_681_600_000, // 2026-02-10T00:00:00Z
            o: Some(10.0),
            h: Some(11.0),
            l: Some(9.5),
            c: Some(10.5),
            v: Some(1_000.0),
        };
        let quote = PolygonProvider::bar_to_quote_data("msft", &bar).unwrap();
        assert_eq!(quote.day, NaiveDate::from_ymd_opt(2026, 2, 10).unwrap());
        assert_eq!(quote.symbol, "MSFT");
        assert!(quote.adjusted);
    }

    #[test]
    fn aggs_response_tolerates_missing_results() {
        let page: AggsResponse = serde_json::from_str(r#"{"status":"OK"}"#).unwrap();
        assert!(page.results.is_empty());
        assert!(page.next_url.is_none());
    }

    #[test]
    fn open_close_not_found_status_parses() {
        let data: DailyOpenClose =
            serde_json::from_str(r#"{"status":"NOT_FOUND","message":"Data not found."}"#).unwrap();
        assert_eq!(data.status.as_deref(), Some("NOT_FOUND"));
        assert!(data.close.is_none());
    }

    #[test]
    fn unconfigured_provider_fails_loudly() {
        let provider = PolygonProvider::new(None, RetryPolicy::none());
        assert!(!provider.is_configured());
        assert!(matches!(
            provider.require_key(),
            Err(MarketDataError::NotConfigured { .. })
        ));
    }
}
