use dashmap::DashMap;
use std::time::{Duration, Instant};

pub mod keys;

/// Read-through cache used by listing endpoints. Strictly a performance
/// optimization: every caller must behave correctly on a miss.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
    fn remove(&self, keys: &[&str]);
}

/// In-process cache with per-entry expiry.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if Instant::now() < *expires_at {
                return Some(value.clone());
            }
        }
        // Expired entries are dropped on the next read
        self.entries.remove(key);
        None
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }

    fn remove(&self, keys: &[&str]) {
        for key in keys {
            self.entries.remove(*key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_value_before_expiry() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn get_drops_expired_entries() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn remove_deletes_multiple_keys() {
        let cache = MemoryCache::new();
        cache.set("a", "1".to_string(), Duration::from_secs(60));
        cache.set("b", "2".to_string(), Duration::from_secs(60));
        cache.remove(&["a", "b"]);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }
}
