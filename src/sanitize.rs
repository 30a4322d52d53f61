use parking_lot::Mutex;

use crate::lru_cache::LruCache;

const FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Drops filesystem-unsafe characters from a string. Memoizes
/// results in a bounded LRU so repeated lookups for the same raw name (e.g.
/// a container or process identifier sampled every pass) are O(1) after the
/// first hit.
pub struct FilenameSanitizer {
    cache: Mutex<LruCache<String, String>>,
}

impl FilenameSanitizer {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::with_capacity(capacity.max(1))),
        }
    }

    pub fn sanitize(&self, raw: &str) -> String {
        let mut cache = self.cache.lock();
        if let (Some(hit), true) = cache.get(&raw.to_string()) {
            return hit.clone();
        }
        let cleaned = sanitize_uncached(raw);
        cache.add(raw.to_string(), cleaned.clone());
        cleaned
    }
}

impl Default for FilenameSanitizer {
    fn default() -> Self {
        Self::new(1000)
    }
}

fn sanitize_uncached(raw: &str) -> String {
    raw.chars().filter(|c| !FORBIDDEN.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_strips_all_forbidden_characters() {
        let sanitizer = FilenameSanitizer::default();
        assert_eq!(
            sanitizer.sanitize("|<*identifier.txt::**?"),
            "identifier.txt"
        );
    }

    #[test]
    fn clean_name_is_unchanged() {
        let sanitizer = FilenameSanitizer::default();
        assert_eq!(sanitizer.sanitize("clean-name.log"), "clean-name.log");
    }

    #[test]
    fn repeated_calls_hit_the_memo_cache() {
        let sanitizer = FilenameSanitizer::new(2);
        let first = sanitizer.sanitize("a:b");
        let second = sanitizer.sanitize("a:b");
        assert_eq!(first, second);
        assert_eq!(first, "ab");
    }

    #[test]
    fn cache_evicts_beyond_capacity_without_changing_results() {
        let sanitizer = FilenameSanitizer::new(1);
        assert_eq!(sanitizer.sanitize("one:two"), "onetwo");
        assert_eq!(sanitizer.sanitize("three:four"), "threefour");
        // "one:two" fell out of the size-1 cache but must still sanitize
        // correctly on recomputation.
        assert_eq!(sanitizer.sanitize("one:two"), "onetwo");
    }
}
