//! Keyed cache for fetched context.
//!
//! Entries are keyed by `(entity kind, subject, window)` and carry the
//! payload, an optional summary, and the time they were written. Stale
//! entries are not removed; callers decide freshness with
//! [`CacheEntry::is_fresh`]. Once the cache holds its capacity, writing a
//! new key evicts the least recently used one. Concurrent writers to the
//! same key are allowed and the last one wins.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::trace;
use uuid::Uuid;

use debie_core::window::LookbackWindow;

/// Category of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Profile,
    Settings,
    Glucose,
    Food,
    Medication,
    Exercise,
    Insulin,
    Biometrics,
    Insights,
    Fitness,
    Calendar,
    /// The consolidated context snapshot.
    Snapshot,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Settings => "settings",
            Self::Glucose => "glucose",
            Self::Food => "food",
            Self::Medication => "medication",
            Self::Exercise => "exercise",
            Self::Insulin => "insulin",
            Self::Biometrics => "biometrics",
            Self::Insights => "insights",
            Self::Fitness => "fitness",
            Self::Calendar => "calendar",
            Self::Snapshot => "snapshot",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite cache key. `window` is `None` for data that is not ranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: EntityKind,
    pub subject: Uuid,
    pub window: Option<LookbackWindow>,
}

impl CacheKey {
    pub fn new(kind: EntityKind, subject: Uuid, window: Option<LookbackWindow>) -> Self {
        Self { kind, subject, window }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.window {
            Some(window) => write!(f, "{}:{}:{}", self.kind, self.subject, window.get()),
            None => write!(f, "{}:{}", self.kind, self.subject),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: serde_json::Value,
    pub summary: Option<serde_json::Value>,
    pub refreshed_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Fresh iff `now - refreshed_at < ttl`.
    ///
    /// An entry stamped in the future (clock skew) counts as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.refreshed_at).to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }
}

pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Shared, clonable handle to the cache.
#[derive(Debug, Clone)]
pub struct ContextCache {
    // `get` updates recency, so reads need exclusive access too.
    entries: Arc<Mutex<LruCache<CacheKey, CacheEntry>>>,
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().await.get(key).cloned()
    }

    /// Insert or replace the entry under `key`.
    pub async fn put(
        &self,
        key: CacheKey,
        payload: serde_json::Value,
        summary: Option<serde_json::Value>,
        refreshed_at: DateTime<Utc>,
    ) {
        let entry = CacheEntry {
            payload,
            summary,
            refreshed_at,
        };
        if let Some((evicted, _)) = self.entries.lock().await.push(key, entry) {
            if evicted != key {
                trace!(key = %evicted, "Cache entry evicted");
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn capacity(&self) -> NonZeroUsize {
        self.entries.lock().await.cap()
    }
}
