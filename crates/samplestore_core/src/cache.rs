//! Aggregate cache lookup and invalidation.
//!
//! # Responsibility
//! - Resolve caches by name, tolerating caches that were never registered.
//! - Drop cached aggregates that a sample write made stale.
//!
//! # Invariants
//! - Invalidation never fails: a missing manager, cache or entry is a no-op.

use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

/// Key under which a project aggregate is cached.
pub fn project_cache_key(project_id: i64) -> String {
    format!("project:{project_id}")
}

/// Minimal cache backend contract.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String);
    /// Removes `key`; returns whether an entry was present.
    fn remove(&self, key: &str) -> bool;
}

/// Process-local cache backend.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: String) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }
}

/// Name-keyed registry of caches.
#[derive(Default)]
pub struct CacheManager {
    caches: RwLock<BTreeMap<String, Arc<dyn Cache>>>,
}

impl CacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `cache` under `name`, replacing any previous registration.
    pub fn register(&self, name: impl Into<String>, cache: Arc<dyn Cache>) {
        self.caches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), cache);
    }

    pub fn get_cache(&self, name: &str) -> Option<Arc<dyn Cache>> {
        self.caches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

/// Removes stale aggregate entries from one named cache.
#[derive(Clone)]
pub struct CacheInvalidator {
    manager: Option<Arc<CacheManager>>,
    cache_name: String,
}

impl CacheInvalidator {
    pub fn new(manager: Option<Arc<CacheManager>>, cache_name: impl Into<String>) -> Self {
        Self {
            manager,
            cache_name: cache_name.into(),
        }
    }

    /// Removes `key` if present. Returns whether an entry was dropped.
    pub fn invalidate(&self, key: &str) -> bool {
        let Some(cache) = self
            .manager
            .as_ref()
            .and_then(|manager| manager.get_cache(&self.cache_name))
        else {
            debug!(
                "event=cache_invalidate module=cache status=skipped reason=no_cache cache={}",
                self.cache_name
            );
            return false;
        };

        let removed = cache.remove(key);
        debug!(
            "event=cache_invalidate module=cache status=ok cache={} removed={}",
            self.cache_name, removed
        );
        removed
    }

    /// Drops the cached aggregate of `project_id`.
    pub fn invalidate_project(&self, project_id: i64) -> bool {
        self.invalidate(&project_cache_key(project_id))
    }
}
