use regex::Regex;
use std::sync::LazyLock;

static RELEASE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").unwrap());

/// Trim whitespace and any surrounding quote characters.
pub fn strip_quotes(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '\'' || c == '"')
}

/// Normalise a runtime version such as `v20.11.1` to `20.11.1`.
/// Anything other than `major.minor.patch` after stripping is rejected.
pub fn normalize_release_version(version: &str) -> Option<String> {
    let normalized = version.trim().trim_start_matches('v');
    if RELEASE_VERSION.is_match(normalized) {
        Some(normalized.to_string())
    } else {
        None
    }
}
