//! Asset link scanning
//!
//! Finds theme and plugin asset references in raw HTML and derives the
//! component slug and (when present) version from the referenced path.

use scraper::{Html, Selector};

/// Directory segment holding themes
pub const THEMES_DIR: &str = "themes";

/// Directory segment holding plugins
pub const PLUGINS_DIR: &str = "plugins";

/// Path marker identifying theme assets
const THEME_MARKER: &str = "/wp-content/themes/";

/// Path marker identifying plugin assets
const PLUGIN_MARKER: &str = "/wp-content/plugins/";

/// A plugin referenced by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCandidate {
    /// Directory name of the plugin
    pub slug: String,
    /// Version taken from the asset query string, if any
    pub version: Option<String>,
}

/// Slug of the first theme asset referenced by the page
pub fn detect_theme_slug(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!(r#"[href*="{THEME_MARKER}"]"#)).ok()?;

    let href = document.select(&selector).next()?.value().attr("href")?;
    slug_after(href, THEMES_DIR)
}

/// Every plugin referenced by `href` or `src` attributes
///
/// Candidates are deduplicated on the exact `(slug, version)` pair and keep
/// the order in which they first appear.
pub fn detect_plugins(html: &str) -> Vec<PluginCandidate> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(&format!(
        r#"[href*="{PLUGIN_MARKER}"], [src*="{PLUGIN_MARKER}"]"#
    )) else {
        return Vec::new();
    };

    let mut candidates: Vec<PluginCandidate> = Vec::new();
    for element in document.select(&selector) {
        let Some(path) = ["href", "src"]
            .into_iter()
            .filter_map(|attr| element.value().attr(attr))
            .find(|value| value.contains(PLUGIN_MARKER))
        else {
            continue;
        };

        let Some(slug) = slug_after(path, PLUGINS_DIR) else {
            continue;
        };
        let candidate = PluginCandidate {
            slug,
            version: version_from_path(path),
        };

        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Path segment following the `dir` segment, e.g. `foo` in `/themes/foo/x.css`
pub fn slug_after(path: &str, dir: &str) -> Option<String> {
    let mut segments = path.split('/');
    segments.find(|segment| *segment == dir)?;
    segments
        .next()
        .filter(|slug| !slug.is_empty())
        .map(str::to_string)
}

/// Value after the last `=` of the path, e.g. `1.2.3` in `x.js?ver=1.2.3`
pub fn version_from_path(path: &str) -> Option<String> {
    path.rsplit_once('=')
        .map(|(_, version)| version.trim())
        .filter(|version| !version.is_empty())
        .map(str::to_string)
}
