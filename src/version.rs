//! Version comparison for detected components

use std::cmp::Ordering;

/// Numeric release parts of a version plus whether a pre-release suffix follows
///
/// `"6.4.2"` is `([6, 4, 2], false)`, `"7.0-beta1"` is `([7, 0], true)`.
/// Strings such as `trunk` have no numeric parts.
fn release_parts(version: &str) -> (Vec<u64>, bool) {
    let version = version.trim().trim_start_matches(['v', 'V']);
    let suffix_at = version.find(|c: char| c == '-' || c.is_ascii_alphabetic());
    let release = suffix_at.map_or(version, |at| &version[..at]);

    let parts = release
        .split('.')
        .map_while(|part| part.parse().ok())
        .collect();

    (parts, suffix_at.is_some())
}

/// Compare two version strings part by part
///
/// Missing trailing parts count as zero and a release sorts after its
/// pre-releases (`7.0 > 7.0-alpha`).
pub fn compare_versions(current: &str, latest: &str) -> Ordering {
    let (current_parts, current_pre) = release_parts(current);
    let (latest_parts, latest_pre) = release_parts(latest);

    let len = current_parts.len().max(latest_parts.len());
    let part = |parts: &[u64], i: usize| parts.get(i).copied().unwrap_or(0);

    (0..len)
        .map(|i| part(&current_parts, i).cmp(&part(&latest_parts, i)))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| latest_pre.cmp(&current_pre))
}

/// Whether `current` is older than `latest`
///
/// Unknown when either side is missing or carries no numeric version
/// (`trunk`, a date string).
pub fn is_outdated(current: Option<&str>, latest: Option<&str>) -> Option<bool> {
    let (current, latest) = (current?, latest?);
    if release_parts(current).0.is_empty() || release_parts(latest).0.is_empty() {
        return None;
    }
    Some(compare_versions(current, latest) == Ordering::Less)
}
