//! WordPress theme and plugin fingerprinting
//!
//! Crawls the target's HTML for theme and plugin asset paths, reads the
//! theme's `style.css` header and reconciles everything with the
//! WordPress.org registry. Nothing in here fails the audit: an unreachable
//! site or registry only degrades the payload to unknown (`null`) fields.

use super::{AuditContext, AuditResult};
use crate::config::AuditConfig;
use crate::header::{THEME_HEADERS, parse_content_headers};
use crate::http::fetch_text;
use crate::links::{self, PluginCandidate, THEMES_DIR};
use crate::registry::{ComponentKind, Registry, RegistryEntry};
use crate::target::ScanTarget;
use crate::version::is_outdated;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Cache key prefix
const CACHE_PREFIX: &str = "tech-audit-";

/// Theme or plugin as shown to the user
///
/// Every `None` serializes as `null` and means "unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub requires_platform_version: Option<String>,
    pub tested_platform_version: Option<String>,
    pub requires_runtime_version: Option<String>,
    pub homepage: Option<String>,
    pub current_version: Option<String>,
    pub new_version: Option<String>,
    pub outdated: Option<bool>,
}

impl ComponentInfo {
    /// Normalize blank strings to unknown and derive `outdated`
    #[allow(clippy::too_many_arguments)]
    fn new(
        name: Option<String>,
        slug: Option<String>,
        requires_platform_version: Option<String>,
        tested_platform_version: Option<String>,
        requires_runtime_version: Option<String>,
        homepage: Option<String>,
        current_version: Option<String>,
        new_version: Option<String>,
    ) -> Self {
        let current_version = non_blank(current_version);
        let new_version = non_blank(new_version);
        let outdated = is_outdated(current_version.as_deref(), new_version.as_deref());

        Self {
            name: non_blank(name),
            slug: non_blank(slug),
            requires_platform_version: non_blank(requires_platform_version),
            tested_platform_version: non_blank(tested_platform_version),
            requires_runtime_version: non_blank(requires_runtime_version),
            homepage: non_blank(homepage),
            current_version,
            new_version,
            outdated,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Normalized fingerprint payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechReport {
    /// Active theme, `null` when none was detected
    pub theme: Option<ComponentInfo>,
    /// Plugins keyed by slug
    pub plugins: BTreeMap<String, ComponentInfo>,
}

/// Header values of a theme's `style.css`; missing headers are empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeStylesheet {
    pub slug: String,
    pub theme_name: String,
    pub homepage: String,
    pub description: String,
    pub version: String,
    pub requires_wp: String,
    pub tested_wp: String,
    pub requires_php: String,
}

impl ThemeStylesheet {
    fn from_headers(slug: String, mut headers: HashMap<String, String>) -> Self {
        let mut take = |field: &str| headers.remove(field).unwrap_or_default();
        Self {
            theme_name: take("theme_name"),
            homepage: take("homepage"),
            description: take("description"),
            version: take("version"),
            requires_wp: take("requires_wp"),
            tested_wp: take("tested_wp"),
            requires_php: take("requires_php"),
            slug,
        }
    }
}

/// Technology fingerprint auditor
#[derive(Debug, Clone)]
pub struct TechFingerprintAuditor {
    client: Client,
    registry: Registry,
    header_overrides: Vec<(String, String)>,
}

impl TechFingerprintAuditor {
    pub const NAME: &'static str = "tech-fingerprint";

    pub fn new(client: Client, config: &AuditConfig) -> Self {
        let registry = Registry::new(client.clone(), &config.registry_base);
        Self {
            client,
            registry,
            header_overrides: config.theme_headers.clone(),
        }
    }

    /// Results are only meaningful when the site runs a recognizable theme
    pub fn include_in_results(&self, payload: &Map<String, Value>) -> bool {
        payload
            .get("theme")
            .and_then(|theme| theme.get("name"))
            .and_then(Value::as_str)
            .is_some_and(|name| !name.trim().is_empty())
    }

    /// Audit `target`, served from cache when possible
    pub async fn audit(&self, target: &ScanTarget, ctx: &AuditContext<'_>) -> AuditResult {
        let key = format!("{}{}", CACHE_PREFIX, target.url());
        ctx.cached(&key, || async {
            let report = self.fingerprint(target).await;
            AuditResult::from_report(&report)
        })
        .await
    }

    /// Detect and reconcile the theme and plugins of `target`
    pub async fn fingerprint(&self, target: &ScanTarget) -> TechReport {
        info!("fingerprinting {}", target.url());
        let html = self.crawl(target).await;

        let theme = match self.theme_stylesheet(target, html.as_deref()).await {
            Some(stylesheet) if !stylesheet.theme_name.trim().is_empty() => {
                Some(self.theme_info(stylesheet).await)
            }
            Some(stylesheet) => {
                debug!("theme '{}' declares no name", stylesheet.slug);
                None
            }
            None => None,
        };

        let candidates = html.as_deref().map(links::detect_plugins).unwrap_or_default();
        let plugins = self.plugins_info(candidates).await;

        TechReport { theme, plugins }
    }

    /// Raw HTML of the target, `None` when the crawler is unavailable
    async fn crawl(&self, target: &ScanTarget) -> Option<String> {
        match fetch_text(&self.client, target.url()).await {
            Ok(html) => Some(html),
            Err(e) => {
                debug!("could not crawl {}: {}", target.url(), e);
                None
            }
        }
    }

    /// Theme slug from the HTML plus whatever its `style.css` declares
    async fn theme_stylesheet(
        &self,
        target: &ScanTarget,
        html: Option<&str>,
    ) -> Option<ThemeStylesheet> {
        let slug = links::detect_theme_slug(html?)?;
        let stylesheet_url =
            target.join_path(&format!("wp-content/{}/{}/style.css", THEMES_DIR, slug));

        let content = match fetch_text(&self.client, &stylesheet_url).await {
            Ok(content) => content,
            Err(e) => {
                debug!("could not fetch {}: {}", stylesheet_url, e);
                String::new()
            }
        };

        Some(self.parse_stylesheet(slug, &content))
    }

    /// Read the header comment of a theme stylesheet, honouring label overrides
    fn parse_stylesheet(&self, slug: String, content: &str) -> ThemeStylesheet {
        let headers: Vec<(&str, &str)> = THEME_HEADERS
            .iter()
            .map(|(field, label)| {
                let label = self
                    .header_overrides
                    .iter()
                    .find(|(f, _)| f == field)
                    .map_or(*label, |(_, l)| l.as_str());
                (*field, label)
            })
            .collect();

        ThemeStylesheet::from_headers(slug, parse_content_headers(content, &headers))
    }

    async fn theme_info(&self, stylesheet: ThemeStylesheet) -> ComponentInfo {
        let current_version = Some(stylesheet.version);
        let homepage = Some(stylesheet.homepage);

        match self
            .registry
            .lookup(ComponentKind::Theme, &stylesheet.slug)
            .await
        {
            // The theme info API does not surface requirement headers
            Some(entry) => ComponentInfo::new(
                Some(entry.name),
                Some(stylesheet.slug),
                None,
                None,
                None,
                homepage,
                current_version,
                entry.version,
            ),
            None => ComponentInfo::new(
                Some(stylesheet.theme_name),
                Some(stylesheet.slug),
                Some(stylesheet.requires_wp),
                Some(stylesheet.tested_wp),
                Some(stylesheet.requires_php),
                homepage,
                current_version,
                None,
            ),
        }
    }

    async fn plugins_info(&self, candidates: Vec<PluginCandidate>) -> BTreeMap<String, ComponentInfo> {
        let mut plugins = BTreeMap::new();

        for candidate in latest_per_slug(candidates) {
            let entry = self
                .registry
                .lookup(ComponentKind::Plugin, &candidate.slug)
                .await;
            let info = plugin_info(&candidate, entry);
            plugins.insert(candidate.slug, info);
        }

        plugins
    }
}

/// One candidate per slug; a later sighting replaces the version of an earlier one
fn latest_per_slug(candidates: Vec<PluginCandidate>) -> Vec<PluginCandidate> {
    let mut versions = BTreeMap::new();
    for candidate in candidates {
        versions.insert(candidate.slug, candidate.version);
    }
    versions
        .into_iter()
        .map(|(slug, version)| PluginCandidate { slug, version })
        .collect()
}

fn plugin_info(candidate: &PluginCandidate, entry: Option<RegistryEntry>) -> ComponentInfo {
    match entry {
        Some(entry) => ComponentInfo::new(
            Some(entry.name),
            entry.slug.or_else(|| Some(candidate.slug.clone())),
            entry.requires,
            entry.tested,
            entry.requires_php,
            entry.homepage,
            candidate.version.clone(),
            entry.version,
        ),
        None => ComponentInfo::new(
            Some(candidate.slug.clone()),
            Some(candidate.slug.clone()),
            None,
            None,
            None,
            None,
            candidate.version.clone(),
            None,
        ),
    }
}
