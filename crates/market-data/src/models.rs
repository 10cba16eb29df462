//! Normalized provider output.

use chrono::NaiveDate;

/// One day of OHLCV data as returned by a provider, before persistence.
///
/// The symbol is normalized to uppercase on construction so every layer
/// above can compare symbols without case juggling. Prices and volume are
/// optional: some providers omit fields for thinly traded instruments.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteData {
    pub symbol: String,
    pub day: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    /// Whether the prices reflect splits and dividends.
    pub adjusted: bool,
}

impl QuoteData {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        day: NaiveDate,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        volume: Option<f64>,
        adjusted: bool,
    ) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            day,
            open,
            high,
            low,
            close,
            volume,
            adjusted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_is_uppercased_on_construction() {
        let day = NaiveDate::from_ymd_opt(2026, 2, 13).unwrap();
        let data = QuoteData::new("aapl", day, Some(1.0), None, None, Some(2.0), None, true);
        assert_eq!(data.symbol, "AAPL");
        assert_eq!(data.day, day);
    }
}
