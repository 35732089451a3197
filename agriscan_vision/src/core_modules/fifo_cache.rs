// THEORY:
// A small bounded map with first-in-first-out eviction. Uploads and tracked
// analysis jobs both live in one of these so memory stays flat no matter how
// long the service runs. Age is insertion order only: reading an entry or
// overwriting its value does not make it younger.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct FifoCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    /// Keys from oldest to newest insertion.
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> FifoCache<K, V> {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity + 1),
            order: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or replaces `key`, then evicts down to capacity. Returns the evicted keys.
    pub fn put(&mut self, key: K, value: V) -> Vec<K> {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
        self.evict_if_over_capacity()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    /// Drops the oldest insertions until at most `capacity` entries remain.
    pub fn evict_if_over_capacity(&mut self) -> Vec<K> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    evicted.push(oldest);
                }
                None => break,
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_insertion_first() {
        let mut cache = FifoCache::new(2);
        assert!(cache.put("a", 1).is_empty());
        assert!(cache.put("b", 2).is_empty());
        assert_eq!(cache.put("c", 3), vec!["a"]);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), Some(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reads_do_not_refresh_age() {
        let mut cache = FifoCache::new(2);
        cache.put(1, "one");
        cache.put(2, "two");
        let _ = cache.get(&1);
        assert_eq!(cache.put(3, "three"), vec![1]);
    }

    #[test]
    fn overwrite_keeps_original_position() {
        let mut cache = FifoCache::new(2);
        cache.put(1, "one");
        cache.put(2, "two");
        assert!(cache.put(1, "uno").is_empty());
        assert_eq!(cache.get(&1), Some(&"uno"));
        assert_eq!(cache.put(3, "three"), vec![1]);
    }

    #[test]
    fn remove_forgets_the_key() {
        let mut cache = FifoCache::new(2);
        cache.put(1, ());
        cache.put(2, ());
        assert_eq!(cache.remove(&1), Some(()));
        assert!(cache.put(3, ()).is_empty());
        assert!(cache.contains(&2) && cache.contains(&3));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut cache = FifoCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put(1, ());
        assert_eq!(cache.put(2, ()), vec![1]);
        assert!(!cache.is_empty());
    }
}
