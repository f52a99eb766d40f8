//! Bounded selector-string caches
//!
//! Insertion-order eviction: when the cache is full the oldest-inserted
//! entry is dropped, regardless of access pattern.

use std::collections::{HashMap, VecDeque};

/// Default capacity of each engine cache
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// String-keyed FIFO cache
#[derive(Debug)]
pub struct FifoCache<V> {
    entries: HashMap<String, V>,
    order: VecDeque<String>,
    capacity: usize,
}

impl<V: Clone> FifoCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Look up an entry by exact selector string
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert an entry, evicting the oldest-inserted when full
    ///
    /// Re-inserting an existing key updates the value in place and keeps
    /// its original queue position.
    pub fn insert(&mut self, key: &str, value: V) {
        if self.entries.insert(key.to_string(), value).is_some() {
            return;
        }
        self.order.push_back(key.to_string());
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
