//! In-flight background-refill bookkeeping.

use std::collections::HashSet;
use std::sync::Mutex;

use super::types::{ProviderId, Symbol};

/// The set of (symbol, provider) pairs with a background refill running.
///
/// `try_begin` is an atomic check-and-insert, so at most one refill task
/// exists per pair. The mutex is held only for the set operation itself,
/// never across a network call or store write.
#[derive(Debug, Default)]
pub struct InflightSet {
    pairs: Mutex<HashSet<(String, String)>>,
}

impl InflightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the pair in-flight. Returns false if a refill is already
    /// running for it.
    pub fn try_begin(&self, symbol: &Symbol, provider: &ProviderId) -> bool {
        let mut pairs = self.pairs.lock().unwrap();
        pairs.insert((symbol.as_str().to_string(), provider.as_str().to_string()))
    }

    /// Releases the pair. Called in every outcome: success, failure, no-op.
    pub fn finish(&self, symbol: &Symbol, provider: &ProviderId) {
        let mut pairs = self.pairs.lock().unwrap();
        pairs.remove(&(symbol.as_str().to_string(), provider.as_str().to_string()));
    }

    pub fn contains(&self, symbol: &Symbol, provider: &ProviderId) -> bool {
        let pairs = self.pairs.lock().unwrap();
        pairs.contains(&(symbol.as_str().to_string(), provider.as_str().to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.lock().unwrap().is_empty()
    }

    /// Sorted snapshot for diagnostics.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self.pairs.lock().unwrap().iter().cloned().collect();
        pairs.sort();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_for_same_pair_is_rejected() {
        let set = InflightSet::new();
        let symbol = Symbol::new("AAPL");
        let provider = ProviderId::new("yahoo");

        assert!(set.try_begin(&symbol, &provider));
        assert!(!set.try_begin(&symbol, &provider));
        assert!(set.contains(&symbol, &provider));

        set.finish(&symbol, &provider);
        assert!(set.is_empty());
        assert!(set.try_begin(&symbol, &provider));
    }

    #[test]
    fn pairs_are_independent() {
        let set = InflightSet::new();
        assert!(set.try_begin(&Symbol::new("AAPL"), &ProviderId::new("yahoo")));
        assert!(set.try_begin(&Symbol::new("AAPL"), &ProviderId::new("polygon")));
        assert!(set.try_begin(&Symbol::new("MSFT"), &ProviderId::new("yahoo")));
        assert_eq!(set.snapshot().len(), 3);
    }
}
