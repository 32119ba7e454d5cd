//! Fixed-capacity memoization of resolved state values.
//!
//! The cache maps a state key to the best *additional* value obtainable from
//! that state onward. When inserting a new key would exceed the capacity, a
//! configured fraction of the entries is evicted first.
//!
//! Eviction only costs reuse, never correctness: the search function is pure,
//! so a state whose entry was evicted is simply resolved again when it is met
//! the next time.

use std::collections::VecDeque;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ConfigError;

/// Which entries to drop when the cache is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Drop the entries that were inserted first.
    #[default]
    Oldest,
}

/// Bounded map from state keys to values.
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    entries: FxHashMap<K, V>,
    /// Keys in insertion order; holds exactly the keys of `entries`.
    order: VecDeque<K>,
    capacity: usize,
    eviction_fraction: f64,
    policy: EvictionPolicy,
    evicted: u64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Copy,
{
    /// Create an empty cache.
    ///
    /// `capacity` must be at least 1 and `eviction_fraction` must lie in
    /// `(0, 1]`.
    pub fn new(
        capacity: usize,
        eviction_fraction: f64,
        policy: EvictionPolicy,
    ) -> Result<Self, ConfigError> {
        validate(capacity, eviction_fraction)?;
        Ok(Self {
            entries: FxHashMap::default(),
            order: VecDeque::new(),
            capacity,
            eviction_fraction,
            policy,
            evicted: 0,
        })
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).copied()
    }

    /// Insert or overwrite the value for `key`.
    ///
    /// Overwriting an existing key never evicts anything and keeps the key's
    /// original insertion position.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict();
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of entries dropped by eviction since creation.
    pub fn evictions(&self) -> u64 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn evict(&mut self) {
        let len = self.entries.len();
        let count = ((len as f64 * self.eviction_fraction).ceil() as usize).clamp(1, len);
        match self.policy {
            EvictionPolicy::Oldest => {
                for key in self.order.drain(..count) {
                    self.entries.remove(&key);
                }
            }
        }
        self.evicted += count as u64;
        trace!(count, remaining = self.entries.len(), "evicted cache entries");
    }
}

pub(crate) fn validate(capacity: usize, eviction_fraction: f64) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::ZeroCapacity);
    }
    if !(eviction_fraction > 0.0 && eviction_fraction <= 1.0) {
        return Err(ConfigError::EvictionFraction(eviction_fraction));
    }
    Ok(())
}
