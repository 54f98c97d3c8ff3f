//! Auditors
//!
//! An auditor scans one target for one concern and produces a flat,
//! UI-ready payload. The set of auditors is closed: [`Auditor`] enumerates
//! the built-in variants and dispatches to them.

pub mod performance;
pub mod tech;

pub use performance::PerformanceAuditor;
pub use tech::TechFingerprintAuditor;

use crate::cache::CacheStore;
use crate::error::Error;
use crate::target::ScanTarget;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;

/// Outcome of a single audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AuditResult {
    /// Normalized payload
    Success { payload: Map<String, Value> },
    /// Audit could not be performed
    Failure { code: String, message: String },
}

impl AuditResult {
    /// Serialize a report into a success payload
    pub fn from_report<T: Serialize>(report: &T) -> Self {
        match serde_json::to_value(report) {
            Ok(Value::Object(payload)) => Self::Success { payload },
            Ok(_) => Self::Success {
                payload: Map::new(),
            },
            Err(e) => Self::failure(&Error::from(e)),
        }
    }

    pub fn failure(error: &Error) -> Self {
        Self::Failure {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }

    /// Only successes with a payload are worth keeping
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Success { payload } if !payload.is_empty())
    }
}

/// Per-scan state handed to an auditor
#[derive(Debug, Clone, Copy)]
pub struct AuditContext<'a> {
    pub cache: &'a dyn CacheStore,
    pub cache_ttl: Duration,
    /// Bypass and replace any cached result
    pub force_refresh: bool,
}

impl AuditContext<'_> {
    /// Return the cached result for `key` or compute, cache and return a new one
    ///
    /// Failures and empty payloads are never cached, so the next scan retries
    /// the remote work.
    pub async fn cached<F, Fut>(&self, key: &str, compute: F) -> AuditResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AuditResult>,
    {
        if self.force_refresh {
            debug!("forcing new results for '{}'", key);
            self.cache.invalidate(key);
        }

        if let Some(hit) = self.cache.get(key) {
            debug!("cache hit for '{}'", key);
            return hit;
        }

        info!("cache miss for '{}', running audit", key);
        let result = compute().await;
        if result.is_cacheable() {
            self.cache.set(key, result.clone(), self.cache_ttl);
        }
        result
    }
}

/// Built-in auditors
#[derive(Debug, Clone)]
pub enum Auditor {
    Performance(PerformanceAuditor),
    TechFingerprint(TechFingerprintAuditor),
}

impl Auditor {
    /// Name the auditor is registered and requested under
    pub fn name(&self) -> &'static str {
        match self {
            Self::Performance(_) => PerformanceAuditor::NAME,
            Self::TechFingerprint(_) => TechFingerprintAuditor::NAME,
        }
    }

    /// Whether a successful payload should be shown to the user
    ///
    /// Decided on the (possibly cached) payload so that a declined target
    /// costs no extra remote calls.
    pub fn include_in_results(&self, payload: &Map<String, Value>) -> bool {
        match self {
            Self::Performance(_) => true,
            Self::TechFingerprint(auditor) => auditor.include_in_results(payload),
        }
    }

    /// Run the audit, going through the cache
    pub async fn audit(&self, target: &ScanTarget, ctx: &AuditContext<'_>) -> AuditResult {
        match self {
            Self::Performance(auditor) => auditor.audit(target, ctx).await,
            Self::TechFingerprint(auditor) => auditor.audit(target, ctx).await,
        }
    }
}

impl From<PerformanceAuditor> for Auditor {
    fn from(auditor: PerformanceAuditor) -> Self {
        Self::Performance(auditor)
    }
}

impl From<TechFingerprintAuditor> for Auditor {
    fn from(auditor: TechFingerprintAuditor) -> Self {
        Self::TechFingerprint(auditor)
    }
}
