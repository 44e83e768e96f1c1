//! TTL-keyed duplicate-signal cache.
//!
//! Injected into the intake rather than living as a module-level singleton,
//! so a multi-instance deployment can swap in a shared store without
//! touching call sites. Single-instance only: there is no cross-process
//! coordination.

use std::time::{Duration, Instant};

use dashmap::DashMap;

pub struct DedupCache {
    window: Duration,
    last_seen: DashMap<String, Instant>,
}

impl DedupCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true if the fingerprint is fresh, recording it; false if an
    /// identical fingerprint was seen inside the window. A rejected
    /// duplicate does not refresh the window. Expired entries are pruned on
    /// every recording write.
    pub fn check_and_record(&self, fingerprint: &str) -> bool {
        if let Some(seen) = self.last_seen.get(fingerprint)
            && seen.elapsed() < self.window
        {
            return false;
        }
        self.last_seen
            .insert(fingerprint.to_string(), Instant::now());
        let window = self.window;
        self.last_seen.retain(|_, seen| seen.elapsed() < window);
        true
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.last_seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_inside_window_is_rejected() {
        let cache = DedupCache::new(Duration::from_secs(60));
        assert!(cache.check_and_record("buy:BTCUSDT:market"));
        assert!(!cache.check_and_record("buy:BTCUSDT:market"));
        assert!(cache.check_and_record("sell:BTCUSDT:market"));
    }

    #[test]
    fn duplicate_after_window_is_fresh_again() {
        let cache = DedupCache::new(Duration::from_millis(20));
        assert!(cache.check_and_record("buy:BTCUSDT:market"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.check_and_record("buy:BTCUSDT:market"));
    }

    #[test]
    fn expired_entries_are_pruned_on_write() {
        let cache = DedupCache::new(Duration::from_millis(20));
        cache.check_and_record("buy:BTCUSDT:market");
        cache.check_and_record("sell:ETHUSDT:limit");
        std::thread::sleep(Duration::from_millis(30));
        cache.check_and_record("close:SOLUSDT:market");
        assert_eq!(cache.len(), 1);
    }
}
