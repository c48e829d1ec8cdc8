//! Read-through content cache.

use std::collections::VecDeque;
use std::sync::Mutex;
use dashmap::DashMap;

/// Concurrent path → body cache holding at most `capacity` entries.
///
/// When full, inserting a new path evicts the oldest inserted one.
#[derive(Debug)]
pub struct ContentCache {
    entries: DashMap<String, Vec<u8>>,
    /// Insertion order, oldest first. Mirrors the keys of `entries`.
    order: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl ContentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    pub fn has_entry(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get_entry(&self, path: &str) -> Option<Vec<u8>> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    /// Insert or replace the body cached for `path`.
    pub fn load_entry(&self, path: &str, body: Vec<u8>) {
        if self.capacity == 0 {
            return;
        }

        let mut order = self.order.lock().expect("content cache mutex poisoned");
        if self.entries.insert(path.to_string(), body).is_some() {
            return;
        }
        order.push_back(path.to_string());

        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.entries.remove(&oldest);
                tracing::trace!(path = %oldest, "Cache entry evicted");
            }
        }
    }

    pub fn delete_entry(&self, path: &str) {
        let mut order = self.order.lock().expect("content cache mutex poisoned");
        if self.entries.remove(path).is_some() {
            order.retain(|p| p != path);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_get_delete() {
        let cache = ContentCache::new(4);
        assert!(!cache.has_entry("/a/1"));

        cache.load_entry("/a/1", b"one".to_vec());
        assert_eq!(cache.get_entry("/a/1"), Some(b"one".to_vec()));

        cache.load_entry("/a/1", b"uno".to_vec());
        assert_eq!(cache.get_entry("/a/1"), Some(b"uno".to_vec()));
        assert_eq!(cache.len(), 1);

        cache.delete_entry("/a/1");
        assert!(cache.is_empty());
        cache.delete_entry("/a/1");
    }

    #[test]
    fn evicts_oldest_insertion() {
        let cache = ContentCache::new(2);
        cache.load_entry("/a/1", b"1".to_vec());
        cache.load_entry("/a/2", b"2".to_vec());
        cache.load_entry("/a/3", b"3".to_vec());

        assert!(!cache.has_entry("/a/1"));
        assert!(cache.has_entry("/a/2"));
        assert!(cache.has_entry("/a/3"));
    }

    #[test]
    fn deleted_keys_leave_eviction_order() {
        let cache = ContentCache::new(2);
        cache.load_entry("/a/1", b"1".to_vec());
        cache.load_entry("/a/2", b"2".to_vec());
        cache.delete_entry("/a/1");
        cache.load_entry("/a/3", b"3".to_vec());

        assert!(cache.has_entry("/a/2"));
        assert!(cache.has_entry("/a/3"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_caches_nothing() {
        let cache = ContentCache::new(0);
        cache.load_entry("/a/1", b"1".to_vec());
        assert!(cache.is_empty());
    }
}
