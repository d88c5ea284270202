//! TTL-aware response cache owned by a single client

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Map, Value};
use tokio::time::Instant;

/// How long a cached GET response is served without touching the network
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Wrapper for a cached payload
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The response payload
    data: Value,
    /// Status of the response that produced the payload
    status: StatusCode,
    /// When the payload was cached
    stored_at: Instant,
}

/// A fresh cache hit
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub data: Value,
    pub status: StatusCode,
    /// Time since the payload was cached
    pub age: Duration,
}

/// Response cache keyed by path + serialized query parameters
///
/// There is no locking beyond the map itself: two concurrent misses on the same
/// key both go to the network and the last response to land wins.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    /// Creates an empty cache whose entries stay fresh for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Builds the cache key for a request.
    ///
    /// Keys match exactly: the same path with different (or absent) params
    /// yields a different key.
    pub fn key(path: &str, params: Option<&Map<String, Value>>) -> String {
        let params = serde_json::to_string(&params).unwrap_or_default();
        format!("{path}{params}")
    }

    /// Returns the entry for `key` if it is younger than the TTL.
    ///
    /// Stale entries are not removed.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        let age = entry.stored_at.elapsed();
        (age < self.ttl).then(|| CachedResponse {
            data: entry.data.clone(),
            status: entry.status,
            age,
        })
    }

    /// Stores a payload under `key`, timestamped now, replacing any previous entry
    pub fn insert(&self, key: impl Into<String>, data: Value, status: StatusCode) {
        let entry = CacheEntry {
            data,
            status,
            stored_at: Instant::now(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
