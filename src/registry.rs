//! Theme and plugin registry lookups
//!
//! Talks to the WordPress.org info API (`/themes/info/1.2/` and
//! `/plugins/info/1.2/`). A slug the registry does not know is not an error:
//! lookups answer `None` and callers fall back to locally detected data.

use crate::error::{Error, Result};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Kind of component looked up in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Theme,
    Plugin,
}

impl ComponentKind {
    fn api_path(self) -> &'static str {
        match self {
            Self::Theme => "themes/info/1.2/",
            Self::Plugin => "plugins/info/1.2/",
        }
    }

    fn action(self) -> &'static str {
        match self {
            Self::Theme => "theme_information",
            Self::Plugin => "plugin_information",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Theme => write!(f, "Theme"),
            Self::Plugin => write!(f, "Plugin"),
        }
    }
}

/// Canonical metadata published by the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub slug: Option<String>,
    pub version: Option<String>,
    pub requires: Option<String>,
    pub tested: Option<String>,
    pub requires_php: Option<String>,
    pub homepage: Option<String>,
}

/// Raw info API response
///
/// `requires`, `tested` and `requires_php` are `false` rather than absent
/// when the author left them out, so they go through [`lenient_string`].
#[derive(Debug, Deserialize)]
struct InfoResponse {
    name: Option<String>,
    slug: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    requires: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    tested: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    requires_php: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    homepage: Option<String>,
    error: Option<String>,
}

/// Accept strings and numbers, treat anything else as absent
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Registry client
#[derive(Debug, Clone)]
pub struct Registry {
    client: Client,
    base_url: String,
}

impl Registry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Look up a theme or plugin by slug
    ///
    /// Transport failures, non-2xx answers and "not found" bodies all yield `None`.
    pub async fn lookup(&self, kind: ComponentKind, slug: &str) -> Option<RegistryEntry> {
        match self.fetch(kind, slug).await {
            Ok(Some(entry)) => Some(entry),
            Ok(None) => {
                debug!("{} '{}' not found in registry", kind, slug);
                None
            }
            Err(e) => {
                debug!("{} '{}' registry lookup failed: {}", kind, slug, e);
                None
            }
        }
    }

    async fn fetch(&self, kind: ComponentKind, slug: &str) -> Result<Option<RegistryEntry>> {
        let url = format!("{}/{}", self.base_url, kind.api_path());
        let response = self
            .client
            .get(&url)
            .query(&[("action", kind.action()), ("slug", slug)])
            .send()
            .await
            .map_err(|e| Error::HttpRequest(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let info: InfoResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        if info.error.is_some() {
            return Ok(None);
        }

        Ok(info.name.map(|name| RegistryEntry {
            name,
            slug: info.slug,
            version: info.version,
            requires: info.requires,
            tested: info.tested,
            requires_php: info.requires_php,
            homepage: info.homepage,
        }))
    }
}
