//! Scan dispatch
//!
//! [`Orchestrator::scan`] is the single entry point used by front ends: it
//! resolves the requested auditor, validates the target, runs the audit and
//! folds every outcome into a [`ScanResponse`] envelope.

use crate::auditor::{AuditContext, AuditResult, Auditor, PerformanceAuditor, TechFingerprintAuditor};
use crate::cache::{CacheStore, MemoryCache};
use crate::config::AuditConfig;
use crate::error::{Error, Result};
use crate::http::build_client;
use crate::target::ScanTarget;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Auditors by name
#[derive(Debug, Clone, Default)]
pub struct AuditorRegistry {
    auditors: BTreeMap<&'static str, Auditor>,
}

impl AuditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in auditor
    pub fn builtin(config: &AuditConfig) -> Result<Self> {
        let client = build_client(config.request_timeout)?;
        let mut registry = Self::new();
        registry.register(PerformanceAuditor::new(client.clone(), config));
        registry.register(TechFingerprintAuditor::new(client, config));
        Ok(registry)
    }

    /// Add an auditor, replacing any auditor with the same name
    pub fn register(&mut self, auditor: impl Into<Auditor>) {
        let auditor = auditor.into();
        self.auditors.insert(auditor.name(), auditor);
    }

    pub fn get(&self, name: &str) -> Option<&Auditor> {
        self.auditors.get(name)
    }

    /// Registered auditor names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.auditors.keys().copied()
    }
}

/// A scan request as received from a front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub url: String,
    pub auditor_source: String,
    #[serde(default)]
    pub force_new_results: bool,
}

impl ScanRequest {
    pub fn new(auditor_source: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auditor_source: auditor_source.into(),
            force_new_results: false,
        }
    }

    pub fn force_new_results(mut self, force: bool) -> Self {
        self.force_new_results = force;
        self
    }
}

/// Error body of a failed scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ScanResponse {
    pub fn success(data: Map<String, Value>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    pub fn from_error(error: &Error) -> Self {
        Self::failure(error.code(), error.to_string())
    }

    /// HTTP status a web front end should answer with
    ///
    /// Only malformed requests get 400; a declined or empty audit is still 200.
    pub fn http_status(&self) -> u16 {
        match self.error.as_ref().map(|e| e.code.as_str()) {
            Some("ews_invalid_auditor_name" | "ews_invalid_url") => 400,
            _ => 200,
        }
    }
}

/// Dispatches scans to registered auditors
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<AuditorRegistry>,
    cache: Arc<dyn CacheStore>,
    config: AuditConfig,
}

impl Orchestrator {
    /// Orchestrator with the built-in auditors and an in-memory cache
    pub fn new(config: AuditConfig) -> Result<Self> {
        let registry = AuditorRegistry::builtin(&config)?;
        Ok(Self::with_parts(registry, Arc::new(MemoryCache::new()), config))
    }

    pub fn with_parts(
        registry: AuditorRegistry,
        cache: Arc<dyn CacheStore>,
        config: AuditConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            cache,
            config,
        }
    }

    /// Run a scan and wrap the outcome in an envelope
    pub async fn scan(&self, request: &ScanRequest) -> ScanResponse {
        let raw_url = ScanTarget::normalize(&request.url);

        let Some(auditor) = self.registry.get(&request.auditor_source) else {
            warn!("unknown auditor '{}'", request.auditor_source);
            return ScanResponse::from_error(&Error::UnknownAuditor(
                request.auditor_source.clone(),
            ));
        };

        let target = match self.resolve_target(raw_url).await {
            Ok(target) => target,
            Err(e) => {
                warn!("rejected target '{}': {}", raw_url, e);
                return ScanResponse::from_error(&e);
            }
        };

        let ctx = AuditContext {
            cache: self.cache.as_ref(),
            cache_ttl: self.config.cache_ttl,
            force_refresh: request.force_new_results,
        };

        match auditor.audit(&target, &ctx).await {
            AuditResult::Failure { code, message } => ScanResponse::failure(code, message),
            AuditResult::Success { payload } if payload.is_empty() => {
                ScanResponse::from_error(&Error::EmptyAudit)
            }
            AuditResult::Success { payload } if !auditor.include_in_results(&payload) => {
                info!("{} declined {}", auditor.name(), target.url());
                ScanResponse::from_error(&Error::AuditorDeclined(auditor.name().to_string()))
            }
            AuditResult::Success { payload } => ScanResponse::success(payload),
        }
    }

    async fn resolve_target(&self, raw_url: &str) -> Result<ScanTarget> {
        let target = ScanTarget::parse(raw_url)?;
        if !self.config.allow_private {
            target.ensure_public().await?;
        }
        Ok(target)
    }
}
