//! Performance / SEO auditor backed by PageSpeed Insights
//!
//! The service returns a full Lighthouse report. Only a slim summary per
//! category and a short, curated list of sub-audits per category make it
//! into the payload.

use super::{AuditContext, AuditResult};
use crate::config::AuditConfig;
use crate::error::{Error, Result};
use crate::target::ScanTarget;
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Cache key prefix
const CACHE_PREFIX: &str = "perf-audit-";

/// Lighthouse categories requested from the service
const CATEGORIES: &[&str] = &["ACCESSIBILITY", "BEST_PRACTICES", "PERFORMANCE", "SEO"];

/// Analysis strategy
const STRATEGY: &str = "desktop";

/// Sub-audits worth showing to an end user
const PRIORITY_AUDIT_IDS: &[&str] = &[
    "first-meaningful-paint",
    "render-blocking-resources",
    "unminified-javascript",
    "uses-optimized-images",
    "modern-image-formats",
    "uses-long-cache-ttl",
    "bootup-time",
    "mainthread-work-breakdown",
    "third-party-summary",
    "unsized-images",
    "button-name",
    "heading-order",
    "link-name",
    "external-anchors-use-rel-noopener",
    "no-vulnerable-libraries",
    "meta-description",
    "tap-targets",
];

/// Audit groups never listed
const EXCLUDED_GROUPS: &[&str] = &["metrics"];

/// Maximum curated audits per category
const MAX_AUDITS_PER_CATEGORY: usize = 5;

/// Guide link for a sub-audit
fn guide_url(audit_id: &str) -> String {
    format!("https://web.dev/{}/", audit_id)
}

/// Severity of a sub-audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    /// Classify a 0-100 score; unscored audits are low impact
    pub fn from_score(score: Option<u32>) -> Self {
        match score {
            None => Self::Low,
            Some(s) if s <= 49 => Self::High,
            Some(s) if s <= 89 => Self::Medium,
            Some(_) => Self::Low,
        }
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Slim category summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: String,
    pub title: String,
    pub score: Option<f64>,
}

/// A curated sub-audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAudit {
    pub impact: Impact,
    /// Score scaled to 0-100
    pub score: Option<u32>,
    /// Category title
    pub category: String,
    /// Sub-audit title
    pub audit: String,
    pub guide_url: String,
}

/// Normalized performance payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Category id to summary
    pub categories: BTreeMap<String, CategorySummary>,
    /// Category key to curated sub-audits
    pub audits: BTreeMap<String, Vec<CategoryAudit>>,
}

impl PerformanceReport {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.audits.is_empty()
    }
}

/// PageSpeed response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSpeedResponse {
    lighthouse_result: Option<LighthouseResult>,
}

#[derive(Debug, Deserialize)]
struct LighthouseResult {
    #[serde(default)]
    categories: BTreeMap<String, LighthouseCategory>,
    #[serde(default)]
    audits: HashMap<String, LighthouseAudit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LighthouseCategory {
    id: String,
    title: String,
    score: Option<f64>,
    #[serde(default)]
    audit_refs: Vec<AuditRef>,
}

#[derive(Debug, Deserialize)]
struct AuditRef {
    id: String,
    group: Option<String>,
}

impl AuditRef {
    fn is_curated(&self) -> bool {
        let excluded = self
            .group
            .as_deref()
            .is_some_and(|group| EXCLUDED_GROUPS.contains(&group));
        !excluded && PRIORITY_AUDIT_IDS.contains(&self.id.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct LighthouseAudit {
    title: Option<String>,
    score: Option<f64>,
}

/// Performance auditor
#[derive(Debug, Clone)]
pub struct PerformanceAuditor {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    locale: String,
    timeout: Duration,
}

impl PerformanceAuditor {
    pub const NAME: &'static str = "performance";

    pub fn new(client: Client, config: &AuditConfig) -> Self {
        Self {
            client,
            endpoint: config.pagespeed_endpoint.clone(),
            api_key: config.pagespeed_api_key.clone(),
            locale: config.locale.clone(),
            timeout: config.analysis_timeout,
        }
    }

    /// Audit `target`, served from cache when possible
    pub async fn audit(&self, target: &ScanTarget, ctx: &AuditContext<'_>) -> AuditResult {
        let key = format!("{}{}", CACHE_PREFIX, target.url());
        ctx.cached(&key, || async {
            match self.run(target).await {
                Ok(report) if report.is_empty() => AuditResult::Success {
                    payload: Default::default(),
                },
                Ok(report) => AuditResult::from_report(&report),
                Err(e) => {
                    warn!("performance audit of {} failed: {}", target.url(), e);
                    AuditResult::failure(&e)
                }
            }
        })
        .await
    }

    async fn run(&self, target: &ScanTarget) -> Result<PerformanceReport> {
        info!("requesting performance analysis for {}", target.url());

        let mut query: Vec<(&str, &str)> = vec![
            ("locale", self.locale.as_str()),
            ("url", target.url()),
            ("strategy", STRATEGY),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }
        query.extend(CATEGORIES.iter().map(|c| ("category", *c)));

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::HttpRequest(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status().as_u16()));
        }

        let body: PageSpeedResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(body
            .lighthouse_result
            .map(normalize)
            .unwrap_or_default())
    }
}

/// Reduce a Lighthouse result to the UI payload
fn normalize(lhr: LighthouseResult) -> PerformanceReport {
    let mut report = PerformanceReport::default();

    for (key, category) in &lhr.categories {
        let audits = category
            .audit_refs
            .iter()
            .filter(|audit_ref| audit_ref.is_curated())
            .take(MAX_AUDITS_PER_CATEGORY)
            .map(|audit_ref| curate(category, audit_ref, lhr.audits.get(&audit_ref.id)))
            .collect();
        report.audits.insert(key.clone(), audits);

        report.categories.insert(
            category.id.clone(),
            CategorySummary {
                id: category.id.clone(),
                title: category.title.clone(),
                score: category.score,
            },
        );
    }

    report
}

fn curate(
    category: &LighthouseCategory,
    audit_ref: &AuditRef,
    audit: Option<&LighthouseAudit>,
) -> CategoryAudit {
    let score = audit
        .and_then(|a| a.score)
        .map(|s| (s * 100.0).round().clamp(0.0, 100.0) as u32);

    CategoryAudit {
        impact: Impact::from_score(score),
        score,
        category: category.title.clone(),
        audit: audit
            .and_then(|a| a.title.clone())
            .unwrap_or_else(|| audit_ref.id.clone()),
        guide_url: guide_url(&audit_ref.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lighthouse(value: serde_json::Value) -> LighthouseResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn impact_bands() {
        assert_eq!(Impact::from_score(Some(0)), Impact::High);
        assert_eq!(Impact::from_score(Some(49)), Impact::High);
        assert_eq!(Impact::from_score(Some(50)), Impact::Medium);
        assert_eq!(Impact::from_score(Some(89)), Impact::Medium);
        assert_eq!(Impact::from_score(Some(90)), Impact::Low);
        assert_eq!(Impact::from_score(Some(100)), Impact::Low);
        assert_eq!(Impact::from_score(None), Impact::Low);
    }

    #[test]
    fn impact_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Impact::Medium).unwrap(), "\"medium\"");
    }

    #[test]
    fn slim_summary_drops_verbose_fields() {
        let report = normalize(lighthouse(json!({
            "categories": {
                "seo": {
                    "id": "seo",
                    "title": "SEO",
                    "score": 0.92,
                    "description": "long text",
                    "manualDescription": "more text",
                    "auditRefs": []
                }
            },
            "audits": {}
        })));

        let value = serde_json::to_value(&report.categories["seo"]).unwrap();
        assert_eq!(value, json!({ "id": "seo", "title": "SEO", "score": 0.92 }));
    }

    #[test]
    fn curated_list_is_filtered_and_truncated_in_source_order() {
        let refs: Vec<_> = [
            ("first-meaningful-paint", "metrics"),
            ("render-blocking-resources", "load-opportunities"),
            ("not-curated", "diagnostics"),
            ("unminified-javascript", "load-opportunities"),
            ("uses-optimized-images", "load-opportunities"),
            ("modern-image-formats", "load-opportunities"),
            ("uses-long-cache-ttl", "diagnostics"),
            ("bootup-time", "diagnostics"),
        ]
        .iter()
        .map(|(id, group)| json!({ "id": id, "group": group }))
        .collect();

        let audits: serde_json::Map<_, _> = [
            "render-blocking-resources",
            "unminified-javascript",
            "uses-optimized-images",
            "modern-image-formats",
            "uses-long-cache-ttl",
            "bootup-time",
        ]
        .iter()
        .map(|id| (id.to_string(), json!({ "id": id, "title": id, "score": 1.0 })))
        .collect();

        let report = normalize(lighthouse(json!({
            "categories": {
                "performance": {
                    "id": "performance", "title": "Performance", "score": 0.5,
                    "auditRefs": refs
                }
            },
            "audits": audits
        })));

        let listed: Vec<_> = report.audits["performance"]
            .iter()
            .map(|a| a.audit.as_str())
            .collect();
        assert_eq!(
            listed,
            vec![
                "render-blocking-resources",
                "unminified-javascript",
                "uses-optimized-images",
                "modern-image-formats",
                "uses-long-cache-ttl",
            ]
        );
        assert!(
            report.audits["performance"]
                .iter()
                .all(|a| a.guide_url.starts_with("https://web.dev/"))
        );
    }

    #[test]
    fn scores_are_scaled_and_classified() {
        let report = normalize(lighthouse(json!({
            "categories": {
                "accessibility": {
                    "id": "accessibility", "title": "Accessibility", "score": 0.8,
                    "auditRefs": [
                        { "id": "button-name", "group": "a11y-names-labels" },
                        { "id": "heading-order", "group": "a11y-navigation" },
                        { "id": "link-name", "group": "a11y-names-labels" },
                        { "id": "tap-targets" }
                    ]
                }
            },
            "audits": {
                "button-name": { "id": "button-name", "title": "Buttons have names", "score": 0.0 },
                "heading-order": { "id": "heading-order", "title": "Headings", "score": 0.5 },
                "link-name": { "id": "link-name", "title": "Links have names", "score": null }
            }
        })));

        let audits = &report.audits["accessibility"];
        assert_eq!(audits.len(), 4);

        assert_eq!(audits[0].score, Some(0));
        assert_eq!(audits[0].impact, Impact::High);
        assert_eq!(audits[0].category, "Accessibility");
        assert_eq!(audits[0].guide_url, "https://web.dev/button-name/");

        assert_eq!(audits[1].score, Some(50));
        assert_eq!(audits[1].impact, Impact::Medium);

        assert_eq!(audits[2].score, None);
        assert_eq!(audits[2].impact, Impact::Low);
        assert_eq!(audits[2].audit, "Links have names");

        // not present in the flat audit map
        assert_eq!(audits[3].score, None);
        assert_eq!(audits[3].impact, Impact::Low);
        assert_eq!(audits[3].audit, "tap-targets");
    }

    #[test]
    fn category_audit_wire_names() {
        let audit = CategoryAudit {
            impact: Impact::High,
            score: Some(12),
            category: "SEO".into(),
            audit: "Document has a meta description".into(),
            guide_url: guide_url("meta-description"),
        };
        let value = serde_json::to_value(&audit).unwrap();
        assert_eq!(value["guideUrl"], "https://web.dev/meta-description/");
        assert_eq!(value["impact"], "high");
    }
}
