/* src/cache.rs */

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Default lifetime of a cached lookup.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
/// Default interval between sweeps of expired entries.
pub const DEFAULT_CACHE_PURGE: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// Concurrent TTL cache keyed by IP string.
///
/// Entries expire `ttl` after insertion and are never returned once expired.
/// Expired entries are reclaimed lazily: the first `set` after each `purge_interval`
/// sweeps the whole map. There is no capacity bound.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    purge_interval: Duration,
    last_purge: Mutex<Instant>,
}

/// Cache of resolved geo records.
pub type GeoCache = TtlCache<crate::geo::GeoRecord>;

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_PURGE)
    }
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the given entry lifetime and sweep interval.
    pub fn new(ttl: Duration, purge_interval: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            purge_interval,
            last_purge: Mutex::new(Instant::now()),
        }
    }

    /// Lifetime of an entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.created_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert or replace the entry for `key` with a fresh timestamp.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.purge_if_due();
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    /// Remove every expired entry.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.created_at.elapsed() < ttl);
    }

    /// Number of stored entries, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_if_due(&self) {
        // Another writer already sweeping is good enough.
        let Ok(mut last) = self.last_purge.try_lock() else {
            return;
        };
        if last.elapsed() < self.purge_interval {
            return;
        }
        *last = Instant::now();
        drop(last);

        let before = self.entries.len();
        self.purge_expired();
        tracing::debug!(
            removed = before.saturating_sub(self.entries.len()),
            "purged expired geo cache entries"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_get_returns_stored_value() {
        let cache: TtlCache<String> = TtlCache::default();
        cache.set("1.1.1.1", "AU".to_string());
        assert_eq!(cache.get("1.1.1.1"), Some("AU".to_string()));
        assert_eq!(cache.get("8.8.8.8"), None);
    }

    #[test]
    fn test_set_replaces_existing_entry() {
        let cache: TtlCache<u32> = TtlCache::default();
        cache.set("1.1.1.1", 1);
        cache.set("1.1.1.1", 2);
        assert_eq!(cache.get("1.1.1.1"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_not_served() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(20), DEFAULT_CACHE_PURGE);
        cache.set("1.1.1.1", 1);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("1.1.1.1"), None);
        // Still stored until a sweep runs.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_purge_expired_reclaims_entries() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(20), DEFAULT_CACHE_PURGE);
        cache.set("1.1.1.1", 1);
        thread::sleep(Duration::from_millis(40));
        cache.set("2.2.2.2", 2);
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("2.2.2.2"), Some(2));
    }

    #[test]
    fn test_lazy_sweep_on_set() {
        let cache: TtlCache<u32> =
            TtlCache::new(Duration::from_millis(10), Duration::from_millis(10));
        cache.set("1.1.1.1", 1);
        thread::sleep(Duration::from_millis(30));
        cache.set("2.2.2.2", 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_writers_leave_one_whole_value() {
        let cache: Arc<TtlCache<(u32, u32)>> = Arc::new(TtlCache::default());
        let handles: Vec<_> = (0..8u32)
            .map(|n| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..100 {
                        cache.set("1.1.1.1", (n, n));
                        let (a, b) = cache.get("1.1.1.1").unwrap();
                        assert_eq!(a, b);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 1);
    }
}
