//! Runtime configuration shared by the auditors

use std::time::Duration;

/// Google PageSpeed Insights v5 endpoint
pub const DEFAULT_PAGESPEED_ENDPOINT: &str =
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// WordPress.org API base URL
pub const DEFAULT_REGISTRY_BASE: &str = "https://api.wordpress.org";

/// Environment variable holding the PageSpeed API key
pub const API_KEY_ENV: &str = "PAGESPEED_API_KEY";

/// Timeout for HTML, stylesheet and registry requests
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The performance service runs a full Lighthouse job and can take very long
const ANALYSIS_TIMEOUT_SECS: u64 = 60 * 60;

/// How long audit results stay cached
const CACHE_TTL_SECS: u64 = 5 * 60;

/// Audit configuration
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Performance-analysis service endpoint
    pub pagespeed_endpoint: String,
    /// API key sent to the performance service
    pub pagespeed_api_key: Option<String>,
    /// Locale requested from the performance service
    pub locale: String,
    /// Base URL of the theme/plugin registry
    pub registry_base: String,
    /// Timeout for short remote calls
    pub request_timeout: Duration,
    /// Timeout for the performance service call
    pub analysis_timeout: Duration,
    /// Lifetime of cached audit results
    pub cache_ttl: Duration,
    /// Allow scanning private/internal IP addresses
    pub allow_private: bool,
    /// `style.css` header labels replacing the defaults, as `(field, label)`
    pub theme_headers: Vec<(String, String)>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            pagespeed_endpoint: DEFAULT_PAGESPEED_ENDPOINT.to_string(),
            pagespeed_api_key: None,
            locale: "en_US".to_string(),
            registry_base: DEFAULT_REGISTRY_BASE.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            analysis_timeout: Duration::from_secs(ANALYSIS_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            allow_private: false,
            theme_headers: Vec::new(),
        }
    }
}

impl AuditConfig {
    /// Default configuration with the API key taken from `PAGESPEED_API_KEY`
    pub fn from_env() -> Self {
        let key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        Self::default().with_api_key(key)
    }

    pub fn with_pagespeed_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.pagespeed_endpoint = endpoint.into();
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.pagespeed_api_key = key;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_registry_base(mut self, base: impl Into<String>) -> Self {
        self.registry_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Read a theme header field under a different label
    ///
    /// e.g. `("version", "Stable tag")`. Unknown fields are ignored.
    pub fn with_theme_header(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.theme_headers.push((field.into(), label.into()));
        self
    }

    /// Allow scanning private/internal IP addresses (localhost, 192.168.x.x, etc.)
    ///
    /// By default, SSRF protection blocks requests to internal networks.
    pub fn allow_private(mut self, allow: bool) -> Self {
        self.allow_private = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.analysis_timeout, Duration::from_secs(3600));
        assert_eq!(config.locale, "en_US");
        assert!(!config.allow_private);
        assert!(config.theme_headers.is_empty());
    }

    #[test]
    fn registry_base_drops_trailing_slash() {
        let config = AuditConfig::default().with_registry_base("http://127.0.0.1:9000/");
        assert_eq!(config.registry_base, "http://127.0.0.1:9000");
    }
}
