//! In-memory result cache keyed by request URL.
//!
//! One map behind one mutex. The lock is held only for the map access, never
//! across a fetch, so concurrent misses on the same key may both go to the
//! network. Entries never expire on their own; eviction is whole-map via
//! [`Cache::clear`], triggered by whoever owns the cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared, clonable handle; clones see the same entries.
#[derive(Debug)]
pub struct Cache<V> {
    entries: Arc<Mutex<HashMap<String, V>>>,
}

impl<V: Clone> Cache<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns an owned copy of the entry for `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// Stores `value`, replacing any previous entry for `key`.
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.lock().insert(key.into(), value);
    }

    /// Replaces the whole map with an empty one.
    pub fn clear(&self) {
        *self.lock() = HashMap::new();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Entries are inserted whole, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn get_put_clear() {
        let cache: Cache<Vec<u32>> = Cache::new();
        assert_eq!(cache.get("a"), None);

        cache.put("a", vec![1, 2]);
        cache.put("b", vec![3]);
        assert_eq!(cache.get("a"), Some(vec![1, 2]));
        assert_eq!(cache.len(), 2);

        cache.put("a", vec![9]);
        assert_eq!(cache.get("a"), Some(vec![9]));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn returned_values_are_independent_copies() {
        let cache: Cache<Vec<u32>> = Cache::new();
        cache.put("k", vec![1]);

        let mut copy = cache.get("k").unwrap();
        copy.push(2);

        assert_eq!(cache.get("k"), Some(vec![1]));
    }

    #[test]
    fn clones_share_entries() {
        let cache: Cache<String> = Cache::new();
        let handle = cache.clone();
        handle.put("k", "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        cache.clear();
        assert!(handle.is_empty());
    }

    #[test]
    fn concurrent_writers_and_clearer() {
        let cache: Cache<usize> = Cache::new();

        let writers: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        cache.put(format!("{t}-{i}"), i);
                        let _ = cache.get(&format!("{t}-{}", i / 2));
                    }
                })
            })
            .collect();
        let clearer = {
            let cache = cache.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    cache.clear();
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        clearer.join().unwrap();

        assert!(cache.len() <= 8 * 200);
        cache.put("after", 1);
        assert_eq!(cache.get("after"), Some(1));
    }
}
