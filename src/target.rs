//! Scan targets
//!
//! A target is the user supplied URL with leading/trailing slashes trimmed.
//! The trimmed string is what auditors key their caches on and build
//! derived URLs from.

use crate::error::{Error, Result};
use std::net::IpAddr;
use tokio::net::lookup_host;
use url::{Host, Url};

/// Allowed URL schemes
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// A validated URL to audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    url: String,
    parsed: Url,
}

impl ScanTarget {
    /// Trim slashes from the raw input
    pub fn normalize(raw: &str) -> &str {
        raw.trim().trim_matches('/')
    }

    /// Parse a raw URL and check its scheme
    ///
    /// Does not resolve the host; see [`ScanTarget::ensure_public`].
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Self::normalize(raw).to_string();
        if url.is_empty() {
            return Err(Error::InvalidUrl("empty URL".to_string()));
        }

        let parsed = Url::parse(&url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        // Validate URL scheme (SSRF protection)
        if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
            return Err(Error::InvalidUrl(format!(
                "scheme '{}' not allowed (use http or https)",
                parsed.scheme()
            )));
        }

        if parsed.host_str().is_none() {
            return Err(Error::InvalidUrl("missing host".to_string()));
        }

        Ok(Self { url, parsed })
    }

    /// Reject localhost and hosts resolving to internal/private addresses (SSRF protection)
    pub async fn ensure_public(&self) -> Result<()> {
        let port = self.parsed.port_or_known_default().unwrap_or(443);
        let addrs: Vec<IpAddr> = match self.parsed.host() {
            Some(Host::Ipv4(ip)) => vec![ip.into()],
            Some(Host::Ipv6(ip)) => vec![ip.into()],
            Some(Host::Domain(domain)) => {
                if domain == "localhost" || domain.ends_with(".localhost") {
                    return Err(Error::InvalidUrl("localhost not allowed".to_string()));
                }
                // Unresolvable hosts fail later, when the auditor connects
                match lookup_host((domain, port)).await {
                    Ok(addrs) => addrs.map(|addr| addr.ip()).collect(),
                    Err(_) => Vec::new(),
                }
            }
            None => return Err(Error::InvalidUrl("missing host".to_string())),
        };

        match addrs.into_iter().find(|ip| is_internal_ip(*ip)) {
            Some(ip) => Err(Error::InvalidUrl(format!(
                "internal/private IP address not allowed: {}",
                ip
            ))),
            None => Ok(()),
        }
    }

    /// Normalized URL string
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Build a URL below the target, e.g. `wp-content/themes/x/style.css`
    pub fn join_path(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

/// Check if an IP address is internal/private (RFC 1918, link-local, loopback, etc.)
fn is_internal_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let [a, b, ..] = ipv4.octets();
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                // Shared address space 100.64.0.0/10
                || (a == 100 && (64..=127).contains(&b))
        }
        IpAddr::V6(ipv6) => {
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local addresses (fc00::/7)
                || (ipv6.segments()[0] & 0xfe00) == 0xfc00
                // Link-local (fe80::/10)
                || (ipv6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn trims_slashes() {
        assert_eq!(
            ScanTarget::normalize("https://example.com/"),
            "https://example.com"
        );
        assert_eq!(
            ScanTarget::normalize("/https://example.com//"),
            "https://example.com"
        );
    }

    #[test]
    fn parse_keeps_trimmed_url() {
        let target = ScanTarget::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(target.url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn join_path_appends_below_target() {
        let target = ScanTarget::parse("http://127.0.0.1/blog/").unwrap();
        assert_eq!(
            target.join_path("/wp-content/themes/foo/style.css"),
            "http://127.0.0.1/blog/wp-content/themes/foo/style.css"
        );
    }

    #[test]
    fn parse_invalid_url() {
        assert!(ScanTarget::parse("not a url").is_err());
        assert!(ScanTarget::parse("///").is_err());
    }

    #[tokio::test]
    async fn reject_localhost() {
        let target = ScanTarget::parse("http://localhost").unwrap();
        let result = target.ensure_public().await;
        assert!(result.unwrap_err().to_string().contains("localhost"));

        let target = ScanTarget::parse("http://foo.localhost").unwrap();
        assert!(target.ensure_public().await.is_err());
    }

    #[tokio::test]
    async fn reject_internal_addresses() {
        for raw in ["http://127.0.0.1:9000", "http://10.1.2.3", "http://[::1]:8080"] {
            let target = ScanTarget::parse(raw).unwrap();
            assert!(target.ensure_public().await.is_err(), "{}", raw);
        }
    }

    #[tokio::test]
    async fn public_address_passes() {
        let target = ScanTarget::parse("http://93.184.216.34").unwrap();
        assert!(target.ensure_public().await.is_ok());
    }

    #[test]
    fn reject_non_http_schemes() {
        let result = ScanTarget::parse("ftp://example.com");
        assert!(result.unwrap_err().to_string().contains("scheme"));
        assert!(ScanTarget::parse("file:///etc/passwd").is_err());
    }

    #[test]
    fn internal_ip_detection() {
        assert!(is_internal_ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
        assert!(is_internal_ip(IpAddr::V4(Ipv4Addr::new(172, 16, 0, 1))));
        assert!(is_internal_ip(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))));
        assert!(is_internal_ip(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
        assert!(is_internal_ip(IpAddr::V4(Ipv4Addr::new(169, 254, 169, 254))));
        assert!(is_internal_ip(IpAddr::V4(Ipv4Addr::new(100, 64, 0, 1))));

        assert!(!is_internal_ip(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))));
        assert!(!is_internal_ip(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))));
    }
}
