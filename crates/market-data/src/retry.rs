//! Fixed-schedule backoff for transient provider failures.

use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::errors::{MarketDataError, RetryClass};

/// Backoff schedule applied to rate-limited or transport-failed requests.
///
/// The default schedule (15s, 30s, 60s) matches the free-tier rate-limit
/// windows of the REST providers. The values are defaults, not invariants;
/// shells may supply their own schedule (tests typically use an empty one).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delays: vec![
                Duration::from_secs(15),
                Duration::from_secs(30),
                Duration::from_secs(60),
            ],
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries. Useful for tests and one-shot tools.
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }
}

/// Runs `op`, retrying on [`RetryClass::WithBackoff`] errors according to
/// the policy. The last error is surfaced once the schedule is exhausted;
/// terminal errors are surfaced immediately.
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, MarketDataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MarketDataError>>,
{
    let mut delays = policy.delays.iter();
    loop {
        match op().await {
            Err(e) if e.retry_class() == RetryClass::WithBackoff => match delays.next() {
                Some(delay) => {
                    warn!(
                        "{} failed transiently ({}); retrying in {}s",
                        label,
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(*delay).await;
                }
                None => return Err(e),
            },
            other => return other,
        }
    }
}
