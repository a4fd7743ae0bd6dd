use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::trace;

use super::model::Strategy;

/// Default memoization window for identical audit requests
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Identity of an upstream request: same URL, strategy and credential
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub url: String,
    pub strategy: Strategy,
    pub api_key: String,
}

impl CacheKey {
    pub fn new(url: &str, strategy: Strategy, api_key: &str) -> Self {
        Self {
            url: url.to_string(),
            strategy,
            api_key: api_key.to_string(),
        }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Expiring key-value store.
///
/// Entries are written once per key and window: an insert for a key whose
/// entry is still live is ignored. Expired entries are replaced on insert,
/// dropped on lookup, and swept by `purge_expired`.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Lookup as seen at `now`
    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                trace!("Dropping expired cache entry");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` unless a live entry already exists. Returns whether it was stored.
    pub fn insert(&self, key: K, value: V) -> bool {
        self.insert_at(key, value, Instant::now())
    }

    pub fn insert_at(&self, key: K, value: V, now: Instant) -> bool {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(&key) {
            if now < existing.expires_at {
                return false;
            }
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
        true
    }

    /// Removes every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        let purged = before - entries.len();
        if purged > 0 {
            trace!("Purged {} expired cache entries", purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        // A panic while holding the lock cannot leave an entry half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K: Eq + Hash, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
