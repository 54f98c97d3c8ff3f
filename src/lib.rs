//! Website Audit - pluggable website auditors behind a single scan entry point
//!
//! Audits a URL for performance/SEO (PageSpeed Insights) or fingerprints its
//! WordPress theme and plugins, caching results for a few minutes.
//!
//! # Example
//!
//! ```no_run
//! use website_audit::{AuditConfig, Orchestrator, ScanRequest};
//!
//! #[tokio::main]
//! async fn main() -> website_audit::Result<()> {
//!     let orchestrator = Orchestrator::new(AuditConfig::from_env())?;
//!     let request = ScanRequest::new("tech-fingerprint", "https://example.com/");
//!     let response = orchestrator.scan(&request).await;
//!     println!("success: {}", response.success);
//!     Ok(())
//! }
//! ```

pub mod auditor;
pub mod cache;
pub mod config;
pub mod error;
pub mod header;
pub mod http;
pub mod links;
pub mod orchestrator;
pub mod output;
pub mod registry;
pub mod target;
pub mod version;

pub use auditor::{AuditContext, AuditResult, Auditor, PerformanceAuditor, TechFingerprintAuditor};
pub use cache::{CacheStore, MemoryCache};
pub use config::AuditConfig;
pub use error::{Error, Result};
pub use orchestrator::{AuditorRegistry, ErrorBody, Orchestrator, ScanRequest, ScanResponse};
pub use output::{OutputFormat, output_response};
pub use target::ScanTarget;
