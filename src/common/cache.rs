//! Fixed-TTL cache.
//!
//! Entries are derived from server state, so concurrent writers simply race and
//! the last write wins. There is no size bound and no eviction policy beyond the TTL.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::common::clock::Clock;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Map whose entries go stale `ttl` after insertion.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value for `key` if it has not expired yet.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let guard = self.entries.lock().ok()?;
        guard
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    /// Return the value for `key` regardless of its age.
    pub fn get_stale(&self, key: &K) -> Option<V> {
        let guard = self.entries.lock().ok()?;
        guard.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(key, Entry { value, expires_at });
        }
    }

    pub fn invalidate(&self, key: &K) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.clear();
        }
    }
}
