//! Per-container pids cache.
//!
//! Keyed by container id, TTL'd with a randomized expiry window in
//! `[2T/3, T)` so that many containers loaded around the same time don't
//! all reload from the runtime in the same pass.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::RngExt;

use crate::lru_cache::LruCache;

struct Entry {
    pids: Vec<u32>,
    created_at: Instant,
    /// Pre-drawn expiry offset within `[2T/3, T)`, fixed at insertion time
    /// so repeated `get` calls see a stable deadline.
    expires_after: Duration,
}

/// TTL'd, size-compactable cache from container id to its observed pids.
pub struct PidsCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, Entry>>,
}

impl PidsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Inserts or refreshes `id`'s pid list, drawing a new randomized
    /// expiry window.
    pub fn put(&self, id: impl Into<String>, pids: Vec<u32>) {
        let expires_after = randomized_expiry(self.ttl);
        self.entries.lock().add(
            id.into(),
            Entry {
                pids,
                created_at: Instant::now(),
                expires_after,
            },
        );
    }

    /// Returns `(pids, true)` if `id` is present and not yet past its
    /// randomized expiry; `(None, false)` on miss or expiry. An expired
    /// entry is removed as a side effect.
    pub fn get(&self, id: &str) -> (Option<Vec<u32>>, bool) {
        let mut entries = self.entries.lock();
        let key = id.to_string();
        let expired = match entries.get(&key) {
            (Some(entry), true) => entry.created_at.elapsed() >= entry.expires_after,
            _ => return (None, false),
        };
        if expired {
            entries.remove(&key);
            return (None, false);
        }
        let (value, _) = entries.get(&key);
        (value.map(|e| e.pids.clone()), true)
    }

    /// Compacts the cache to `container_count` entries after a sampling
    /// pass, evicting least-recently-used entries first.
    pub fn compact_to(&self, container_count: usize) {
        self.entries.lock().remove_until_len(container_count);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Draws a uniformly random offset in `[2T/3, T)`, spreading reloads to
/// avoid a stampede when many containers are cached around the same
/// instant.
fn randomized_expiry(ttl: Duration) -> Duration {
    if ttl.is_zero() {
        return Duration::ZERO;
    }
    let lower = ttl.mul_f64(2.0 / 3.0);
    let span = ttl.saturating_sub(lower);
    if span.is_zero() {
        return lower;
    }
    let jitter_nanos = rand::rng().random_range(0u128..span.as_nanos().max(1));
    lower + Duration::from_nanos(jitter_nanos as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn put_then_get_returns_pids_with_hit() {
        let cache = PidsCache::new(Duration::from_secs(60));
        cache.put("C1", vec![1, 2, 3]);
        let (pids, hit) = cache.get("C1");
        assert!(hit);
        assert_eq!(pids, Some(vec![1, 2, 3]));
    }

    #[test]
    fn get_on_missing_id_is_a_clean_miss() {
        let cache = PidsCache::new(Duration::from_secs(60));
        let (pids, hit) = cache.get("nope");
        assert!(!hit);
        assert_eq!(pids, None);
    }

    #[test]
    fn entry_before_two_thirds_ttl_always_hits() {
        let cache = PidsCache::new(Duration::from_millis(300));
        cache.put("C1", vec![7]);
        sleep(Duration::from_millis(50));
        let (pids, hit) = cache.get("C1");
        assert!(hit);
        assert_eq!(pids, Some(vec![7]));
    }

    #[test]
    fn entry_past_full_ttl_always_expires() {
        let cache = PidsCache::new(Duration::from_millis(20));
        cache.put("C1", vec![7]);
        sleep(Duration::from_millis(40));
        let (pids, hit) = cache.get("C1");
        assert!(!hit);
        assert_eq!(pids, None);
    }

    #[test]
    fn compact_to_drops_least_recently_used_entries() {
        let cache = PidsCache::new(Duration::from_secs(60));
        cache.put("C1", vec![1]);
        cache.put("C2", vec![2]);
        cache.put("C3", vec![3]);
        cache.compact_to(1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("C3").1);
    }

    #[test]
    fn zero_ttl_always_expires_immediately() {
        let cache = PidsCache::new(Duration::ZERO);
        cache.put("C1", vec![1]);
        let (_, hit) = cache.get("C1");
        assert!(!hit);
    }
}
