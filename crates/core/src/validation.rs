//! Symbol format validation shared by the shells.

/// Basic ticker format check: alphanumeric plus `.`/`-`, 1-10 characters.
///
/// This is a cheap syntactic gate the shells apply before calling the
/// engine; tradeable-symbol existence is the providers' job.
pub fn is_valid_symbol_format(symbol: &str) -> bool {
    let len = symbol.chars().count();
    if len == 0 || len > 10 {
        return false;
    }
    symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_tickers() {
        for symbol in ["AAPL", "BRK.B", "BTC-USD", "aapl", "A", "ABCDEFGHIJ"] {
            assert!(is_valid_symbol_format(symbol), "{symbol} should be valid");
        }
    }

    #[test]
    fn rejects_bad_formats() {
        for symbol in ["", "TOOLONGSYMBOL", "AAPL!", "A APL", "ап"] {
            assert!(!is_valid_symbol_format(symbol), "{symbol} should be invalid");
        }
    }
}
