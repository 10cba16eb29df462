//! HTTP routes: thin handlers over the quote engine.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use quotecache_core::validation::is_valid_symbol_format;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn check_symbol(symbol: &str) -> Result<(), ApiError> {
    if is_valid_symbol_format(symbol) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Invalid symbol '{}'",
            symbol
        )))
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Invalid date format. Use YYYY-MM-DD.".to_string()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn quote_latest(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    check_symbol(&symbol)?;
    let provider = params.get("provider").map(String::as_str);

    let result = state.quote_service.resolve_latest(&symbol, provider).await?;
    match result {
        Some(resolved) => Ok(Json(serde_json::to_value(resolved).unwrap_or_default())),
        None => Err(ApiError::NotFound(format!(
            "No quote available for {}",
            symbol.to_uppercase()
        ))),
    }
}

async fn quote_for_day(
    State(state): State<Arc<AppState>>,
    Path((symbol, date_str)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    check_symbol(&symbol)?;
    let day = parse_date(&date_str)?;
    let provider = params.get("provider").map(String::as_str);

    // ?provider=all compares every provider's cached row for the day.
    if provider == Some("all") {
        let quotes = state.quote_service.resolve_all_providers(&symbol, day)?;
        return Ok(Json(json!({
            "symbol": symbol.to_uppercase(),
            "date": date_str,
            "quotes": quotes,
        })));
    }

    let result = state.quote_service.resolve(&symbol, day, provider).await?;
    match result {
        Some(resolved) => Ok(Json(serde_json::to_value(resolved).unwrap_or_default())),
        None => Err(ApiError::NotFound(format!(
            "No quote found for {} on {}",
            symbol.to_uppercase(),
            date_str
        ))),
    }
}

async fn history(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    check_symbol(&symbol)?;
    let years: u32 = params
        .get("years")
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);
    let provider = params.get("provider").map(String::as_str);

    let end = chrono::Utc::now().date_naive();
    let start = end
        .checked_sub_months(chrono::Months::new(years * 12))
        .unwrap_or(end);

    let quotes = state.quote_service.get_history(&symbol, start, end, provider)?;
    Ok(Json(json!({
        "symbol": symbol.to_uppercase(),
        "start": start.format("%Y-%m-%d").to_string(),
        "end": end.format("%Y-%m-%d").to_string(),
        "count": quotes.len(),
        "quotes": quotes,
    })))
}

async fn cache_info(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let info = state.quote_service.cache_info()?;
    Ok(Json(serde_json::to_value(info).unwrap_or_default()))
}

async fn symbol_info(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<Value>> {
    check_symbol(&symbol)?;
    match state.quote_service.symbol_info(&symbol)? {
        Some(info) => Ok(Json(serde_json::to_value(info).unwrap_or_default())),
        None => Err(ApiError::NotFound(format!(
            "No data cached for {}",
            symbol.to_uppercase()
        ))),
    }
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stock/quote/{symbol}", get(quote_latest))
        .route("/stock/quote/{symbol}/{date}", get(quote_for_day))
        .route("/stock/history/{symbol}", get(history))
        .route("/stock/info", get(cache_info))
        .route("/stock/info/{symbol}", get(symbol_info))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
