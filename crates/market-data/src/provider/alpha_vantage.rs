//! Alpha Vantage provider.
//!
//! Uses the `TIME_SERIES_DAILY` REST endpoint. The free tier is aggressively
//! rate limited and signals it with a `"Note"`/`"Information"` body instead
//! of an HTTP status, so both paths classify as rate-limited and go through
//! the backoff schedule. TIME_SERIES_DAILY is an unadjusted series, so
//! quotes from this provider carry `adjusted = false`.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::QuoteData;
use crate::provider::QuoteProvider;
use crate::retry::{with_backoff, RetryPolicy};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AlphaVantageProvider {
    client: Client,
    api_key: Option<String>,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

#[derive(Debug, Deserialize)]
struct SymbolSearchResponse {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
}

impl AlphaVantageProvider {
    pub const ID: &'static str = "alpha_vantage";

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

    async fn request(&self, params: &[(&str, &str)]) -> Result<Value, MarketDataError> {
        let response = self.client.get(BASE_URL).query(params).send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: Self::ID.to_string(),
            });
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::ProviderError {
                provider: Self::ID.to_string(),
                message: body,
            });
        }

        let body: Value = response.json().await?;
        classify_body(&body)?;
        Ok(body)
    }

    async fn fetch_daily(
        &self,
        symbol: &str,
        outputsize: &str,
    ) -> Result<BTreeMap<NaiveDate, DailyBar>, MarketDataError> {
        let key = self.require_key()?;
        let params = [
            ("function", "TIME_SERIES_DAILY"),
            ("symbol", symbol),
            ("outputsize", outputsize),
            ("apikey", key),
        ];
        let body = with_backoff(&self.retry, "alpha_vantage daily series", || {
            self.request(&params)
        })
        .await?;
        parse_daily_series(&body)
    }

    fn bar_to_quote_data(symbol: &str, day: NaiveDate, bar: &DailyBar) -> QuoteData {
        QuoteData::new(
            symbol,
            day,
            bar.open.parse().ok(),
            bar.high.parse().ok(),
            bar.low.parse().ok(),
            bar.close.parse().ok(),
            bar.volume.parse().ok(),
            false,
        )
    }
}

/// Turns Alpha Vantage's in-band error envelopes into typed errors.
fn classify_body(body: &Value) -> Result<(), MarketDataError> {
    if body.get("Note").is_some() || body.get("Information").is_some() {
        return Err(MarketDataError::RateLimited {
            provider: AlphaVantageProvider::ID.to_string(),
        });
    }
    if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
        return Err(MarketDataError::ProviderError {
            provider: AlphaVantageProvider::ID.to_string(),
            message: message.to_string(),
        });
    }
    Ok(())
}

fn parse_daily_series(body: &Value) -> Result<BTreeMap<NaiveDate, DailyBar>, MarketDataError> {
    let Some(series) = body.get("Time Series (Daily)") else {
        return Ok(BTreeMap::new());
    };
    let raw: BTreeMap<String, DailyBar> =
        serde_json::from_value(series.clone()).map_err(|e| MarketDataError::ParseError {
            provider: AlphaVantageProvider::ID.to_string(),
            message: e.to_string(),
        })?;

    let mut series = BTreeMap::new();
    for (day_str, bar) in raw {
        let day = NaiveDate::parse_from_str(&day_str, "%Y-%m-%d").map_err(|_| {
            MarketDataError::ParseError {
                provider: AlphaVantageProvider::ID.to_string(),
                message: format!("invalid series date '{}'", day_str),
            }
        })?;
        series.insert(day, bar);
    }
    Ok(series)
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
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
        let series = self.fetch_daily(symbol, "compact").await?;
        Ok(series
            .get(&day)
            .map(|bar| Self::bar_to_quote_data(symbol, day, bar)))
    }

    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<QuoteData>, MarketDataError> {
        let series = self.fetch_daily(symbol, "full").await?;
        Ok(series
            .range(start..=end)
            .map(|(day, bar)| Self::bar_to_quote_data(symbol, *day, bar))
            .collect())
    }

    async fn validate_symbol(&self, symbol: &str) -> Result<bool, MarketDataError> {
        let key = self.require_key()?;
        let params = [
            ("function", "SYMBOL_SEARCH"),
            ("keywords", symbol),
            ("apikey", key),
        ];
        let body = with_backoff(&self.retry, "alpha_vantage symbol search", || {
            self.request(&params)
        })
        .await?;
        let search: SymbolSearchResponse =
            serde_json::from_value(body).map_err(|e| MarketDataError::ParseError {
                provider: Self::ID.to_string(),
                message: e.to_string(),
            })?;
        Ok(search
            .best_matches
            .iter()
            .any(|m| m.symbol.eq_ignore_ascii_case(symbol)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_daily_series_payload() {
        let body = json!({
            "Meta Data": { "2. Symbol": "AAPL" },
            "Time Series (Daily)": {
                "2026-02-13": {
                    "1. open": "230.10",
                    "2. high": "233.00",
                    "3. low": "229.55",
                    "4. close": "232.47",
                    "5. volume": "51230400"
                }
            }
        });
        let series = parse_daily_series(&body).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 2, 13).unwrap();
        let bar = series.get(&day).unwrap();
        let quote = AlphaVantageProvider::bar_to_quote_data("aapl", day, bar);
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.close, Some(232.47));
        assert_eq!(quote.volume, Some(51_230_400.0));
        assert!(!quote.adjusted);
    }

    #[test]
    fn missing_series_is_empty_not_an_error() {
        let body = json!({ "Meta Data": {} });
        assert!(parse_daily_series(&body).unwrap().is_empty());
    }

    #[test]
    fn note_body_classifies_as_rate_limited() {
        let body = json!({ "Note": "Thank you for using Alpha Vantage!" });
        assert!(matches!(
            classify_body(&body),
            Err(MarketDataError::RateLimited { .. })
        ));
    }

    #[test]
    fn error_message_body_classifies_as_provider_error() {
        let body = json!({ "Error Message": "Invalid API call." });
        assert!(matches!(
            classify_body(&body),
            Err(MarketDataError::ProviderError { .. })
        ));
    }

    #[test]
    fn unconfigured_provider_fails_loudly() {
        let provider = AlphaVantageProvider::new(None, RetryPolicy::none());
        assert!(!provider.is_configured());
        assert!(matches!(
            provider.require_key(),
            Err(MarketDataError::NotConfigured { .. })
        ));
    }
}
