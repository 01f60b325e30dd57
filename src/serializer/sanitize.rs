//! URL and title sanitization.

use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Title used when a tab has none.
pub const DEFAULT_TITLE: &str = "Untitled";

/// URL used when a tab has none.
pub const BLANK_URL: &str = "about:blank";

/// Query parameter prefix used by campaign tracking.
const TRACKING_PREFIX: &str = "utm_";

/// Click and analytics identifiers.
const TRACKING_PARAMS: [&str; 5] = ["fbclid", "gclid", "msclkid", "_ga", "mc_eid"];

// ============================================================================
// URLs
// ============================================================================

/// Returns `true` if `name` is a tracking query parameter.
#[must_use]
pub fn is_tracking_param(name: &str) -> bool {
    name.starts_with(TRACKING_PREFIX) || TRACKING_PARAMS.contains(&name)
}

/// Removes tracking query parameters from a URL.
///
/// Unparsable URLs, and URLs with nothing to remove, are returned exactly
/// as given.
#[must_use]
pub fn sanitize_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    if url.query().is_none() {
        return raw.to_string();
    }

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let kept: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(name, _)| !is_tracking_param(name))
        .collect();

    if kept.len() == pairs.len() {
        return raw.to_string();
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    url.to_string()
}

/// Returns the host and scheme (with trailing colon) of a URL.
///
/// Unparsable URLs yield empty strings.
#[must_use]
pub fn url_parts(raw: &str) -> (String, String) {
    match Url::parse(raw) {
        Ok(url) => (
            url.host_str().unwrap_or_default().to_string(),
            format!("{}:", url.scheme()),
        ),
        Err(_) => (String::new(), String::new()),
    }
}

// ============================================================================
// Titles
// ============================================================================

/// Trims a title and caps it at [`MAX_TITLE_CHARS`] characters.
///
/// Missing or blank titles become [`DEFAULT_TITLE`].
#[must_use]
pub fn sanitize_title(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    trimmed.chars().take(MAX_TITLE_CHARS).collect()
}

// ============================================================================
// Tests
// ============================================================================
