//! Audit result cache
//!
//! Remote audits are slow and rate limited, so results are kept for a short
//! time keyed by auditor and target URL.

use crate::auditor::AuditResult;
use log::trace;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Key/value store for audit results
///
/// Implementations must be safe to share between concurrent scans. Writes are
/// last-writer-wins.
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// Cached value for `key`, `None` when absent or expired
    fn get(&self, key: &str) -> Option<AuditResult>;

    /// Store `value` under `key` for `ttl`
    fn set(&self, key: &str, value: AuditResult, ttl: Duration);

    /// Drop any value stored under `key`
    fn invalidate(&self, key: &str);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: AuditResult,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache backed by a map
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<AuditResult> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if !entry.is_expired(Instant::now()) {
            return Some(entry.value.clone());
        }

        trace!("cache entry '{}' expired", key);
        entries.remove(key);
        None
    }

    /// Expired entries of other keys are swept on every write
    fn set(&self, key: &str, value: AuditResult, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }
}
