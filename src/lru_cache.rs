use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache as RawLru;

/// Insertion-ordered bounded cache. `add`/`get` move the touched
/// entry to the front; `remove_until_len` drops from the back until the
/// cache holds at most `n` entries. Used by the sanitize-filename memoizer
/// and by the per-container pids cache.
pub struct LruCache<K, V> {
    inner: RawLru<K, V>,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Builds a cache with effectively no capacity bound (bounded instead by
    /// explicit `remove_until_len` calls, matching the pids cache's
    /// post-pass compaction.
    pub fn unbounded() -> Self {
        Self {
            inner: RawLru::unbounded(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: RawLru::new(cap),
        }
    }

    /// Inserts or updates `key`, moving it to the front. Returns the
    /// previous value, if any.
    pub fn add(&mut self, key: K, value: V) -> Option<V> {
        self.inner.put(key, value)
    }

    /// Looks up `key`, moving it to the front on a hit. Returns
    /// `(value, hit)`.
    pub fn get(&mut self, key: &K) -> (Option<&V>, bool)
    where
        K: Clone,
    {
        match self.inner.get(key) {
            Some(v) => (Some(v), true),
            None => (None, false),
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }

    /// Evicts and returns the least-recently-used entry.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        self.inner.pop_lru()
    }

    /// Drops entries from the back until the cache holds at most `n`.
    pub fn remove_until_len(&mut self, n: usize) {
        while self.inner.len() > n {
            if self.inner.pop_lru().is_none() {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.iter().map(|(k, _)| k)
    }
}
