//! Bounded in-memory cache backed by moka.

use std::hash::Hash;

use moka::sync::Cache;

/// Thread-safe cache with LRU-style eviction once `capacity` entries are held.
///
/// The engine keeps imported flows here (`MemCache<RowKey, Flow>`) so repeated
/// loads of the same row skip decoding.
#[derive(Clone)]
pub struct MemCache<K, V> {
    entries: Cache<K, V>,
}

impl<K, V> MemCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::new(capacity),
        }
    }

    pub fn set(
        &self,
        key: K,
        value: V,
    ) {
        self.entries.insert(key, value);
    }

    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.get(key)
    }

    pub fn remove(
        &self,
        key: &K,
    ) {
        self.entries.invalidate(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let cache = MemCache::<String, u32>::new(8);
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        cache.remove(&"a".to_string());
        assert_eq!(cache.get(&"a".to_string()), None);
    }
}
