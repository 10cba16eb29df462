//! Engine constants.

/// Maximum number of days the resolver walks backward from the requested
/// day looking for the most recent prior trading session.
pub const MAX_FALLBACK_DAYS: i64 = 7;

/// Stored-row threshold below which a resolution opportunistically triggers
/// a background history refill for the (symbol, provider) pair.
pub const DEFAULT_REFILL_THRESHOLD: i64 = 30;

/// Years of history fetched by a background refill.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 3;

/// Provider used when the caller does not name one.
pub const DEFAULT_PROVIDER: &str = "yahoo";
