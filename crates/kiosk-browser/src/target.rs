//! Target resolution
//!
//! Derives the host string used to pick the right browser target out of
//! the ones Chromium spawns. App-mode windows appear asynchronously and
//! their URL may differ from the configured string (redirects, protocol
//! normalization), so acquisition matches on host substring rather than
//! the exact URL.

use url::Url;

/// Host of the configured target URL, or an empty string when the URL is
/// not parseable. An empty host routes acquisition to the
/// fallback-to-first-page path.
pub fn target_host(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}
