//! Header-comment metadata extraction
//!
//! Theme stylesheets (and plugin main files) describe themselves in a
//! leading comment block:
//!
//! ```text
//! /*
//! Theme Name: Twenty Twenty-Four
//! Version: 1.2
//! */
//! ```
//!
//! [`parse_content_headers`] pulls the values for a dictionary of
//! `field -> header label` pairs out of such a blob.

use regex::Regex;
use std::collections::HashMap;

/// Header labels read from a theme's `style.css`
pub const THEME_HEADERS: &[(&str, &str)] = &[
    ("theme_name", "Theme Name"),
    ("homepage", "Theme URI"),
    ("description", "Description"),
    ("version", "Version"),
    ("requires_wp", "Requires at least"),
    ("tested_wp", "Tested up to"),
    ("requires_php", "Requires PHP"),
];

/// Extract every header of `headers` from `content`
///
/// Missing headers map to an empty string. Matching is case-insensitive and
/// tolerates comment decoration (`*`, `#`, `@`, `/`) before the label.
pub fn parse_content_headers(content: &str, headers: &[(&str, &str)]) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(field, label)| (field.to_string(), extract_header(content, label)))
        .collect()
}

/// Extract a single header value, empty when absent
pub fn extract_header(content: &str, label: &str) -> String {
    let pattern = format!(
        r"(?mi)^(?:[ \t]*<\?php)?[ \t/*#@]*{}:(.*)$",
        regex::escape(label)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return String::new();
    };

    // Make sure we catch CR-only line endings
    let content = content.replace('\r', "\n");

    re.captures(&content)
        .and_then(|caps| caps.get(1))
        .map(|m| cleanup_header_comment(m.as_str()))
        .unwrap_or_default()
}

/// Strip a trailing comment terminator and surrounding whitespace
fn cleanup_header_comment(value: &str) -> String {
    let end = [value.find("*/"), value.find("?>")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(value.len());
    value[..end].trim().to_string()
}
