//! Pure helpers that turn scraped hrefs and configured handles into canonical
//! absolute URLs.

use std::sync::LazyLock;

use regex::Regex;

static ITEM_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/video/(\d+)").expect("valid regex"));

/// Canonical form of an item href.
///
/// Root-relative references get `origin` prepended, protocol-relative ones
/// get `https:`, absolute ones pass through unchanged. Blank input yields
/// `None`.
#[must_use]
pub fn normalize_reference(raw: &str, origin: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("https://") || raw.starts_with("http://") {
        return Some(raw.to_owned());
    }
    if raw.starts_with("//") {
        return Some(format!("https:{raw}"));
    }

    let origin = origin.trim_end_matches('/');
    if raw.starts_with('/') {
        Some(format!("{origin}{raw}"))
    } else {
        Some(format!("{origin}/{raw}"))
    }
}

/// Profile page URL for a handle (`@user` or `user`) or a full profile URL.
#[must_use]
pub fn profile_url(identifier: &str, origin: &str) -> String {
    let identifier = identifier.trim();
    if identifier.starts_with("https://") || identifier.starts_with("http://") {
        return identifier.trim_end_matches('/').to_owned();
    }
    let handle = identifier.trim_matches('/').trim_start_matches('@');
    format!("{}/@{handle}", origin.trim_end_matches('/'))
}

/// Numeric item id embedded in a reference, e.g. `7301` in `/@u/video/7301`.
#[must_use]
pub fn item_id(reference: &str) -> Option<String> {
    ITEM_ID_RE
        .captures(reference)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
