//! # TTL Cache
//!
//! Insertion-stamped map used for both the address cache and the value cache.
//!
//! Entries are never evicted. Staleness is checked on read: an entry inserted
//! at `T` is treated as absent for any read at `T + ttl` or later. Callers pass
//! the current instant explicitly so a batch of inserts can share one stamp.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Map of values that expire a fixed duration after insertion
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Return a clone of the value if it is still fresh at `now`
    pub fn get(&self, key: &K, now: Instant) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.inserted_at) < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Insert or replace a value stamped with `now`
    pub fn insert(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Configured time-to-live
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, fresh or stale
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
