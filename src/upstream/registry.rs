use super::version::normalize_release_version;
use super::{HttpFetcher, PinResolver, render_url};
use colored::Colorize;
use serde_json::Value;

const MAX_METADATA_BYTES: usize = 10 * 1024 * 1024;

/// Reads a pinned runtime version from npm registry metadata for one
/// `package@version` (e.g. `_nodeVersion` of agent-browser).
pub struct RegistryMetadataResolver {
    fetcher: HttpFetcher,
    url_template: String,
    package: String,
    field: String,
}

impl RegistryMetadataResolver {
    pub fn new(
        fetcher: HttpFetcher,
        url_template: impl Into<String>,
        package: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            url_template: url_template.into(),
            package: package.into(),
            field: field.into(),
        }
    }

    fn fetch_metadata(&self, version: &str) -> Option<Value> {
        let url = match render_url(&self.url_template, version, Some(self.package.as_str())) {
            Ok(url) => url,
            Err(e) => {
                println!("{} {e}", "Warning:".yellow());
                return None;
            }
        };

        let body = self
            .fetcher
            .fetch_bytes(&url, MAX_METADATA_BYTES)
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).map_err(|e| e.to_string()));

        match body {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                println!(
                    "{} Failed to fetch npm metadata for {}@{}: {e}",
                    "Warning:".yellow(),
                    self.package,
                    version
                );
                None
            }
        }
    }
}

impl PinResolver for RegistryMetadataResolver {
    fn resolve(&self, version: &str) -> Option<String> {
        let metadata = self.fetch_metadata(version)?;
        pinned_from_metadata(&metadata, &self.field, &self.package, version)
    }
}

/// Read `field` from registry metadata and normalise it to `major.minor.patch`.
pub fn pinned_from_metadata(
    metadata: &Value,
    field: &str,
    package: &str,
    version: &str,
) -> Option<String> {
    let Some(raw) = metadata.get(field).and_then(Value::as_str) else {
        println!(
            "{} npm metadata missing {field} for {package}@{version}",
            "Warning:".yellow()
        );
        return None;
    };

    let normalized = normalize_release_version(raw);
    if normalized.is_none() {
        println!(
            "{} Invalid {field} in npm metadata for {package}@{version}: {raw}",
            "Warning:".yellow()
        );
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_node_version() {
        let metadata = json!({
            "name": "agent-browser",
            "version": "0.9.1",
            "_nodeVersion": "v22.14.0"
        });
        assert_eq!(
            pinned_from_metadata(&metadata, "_nodeVersion", "agent-browser", "0.9.1"),
            Some("22.14.0".to_string())
        );
    }

    #[test]
    fn missing_field_yields_none() {
        let metadata = json!({ "name": "agent-browser" });
        assert_eq!(
            pinned_from_metadata(&metadata, "_nodeVersion", "agent-browser", "0.9.1"),
            None
        );
    }

    #[test]
    fn non_string_field_yields_none() {
        let metadata = json!({ "_nodeVersion": 22 });
        assert_eq!(
            pinned_from_metadata(&metadata, "_nodeVersion", "agent-browser", "0.9.1"),
            None
        );
    }

    #[test]
    fn malformed_version_yields_none() {
        let metadata = json!({ "_nodeVersion": "22.x" });
        assert_eq!(
            pinned_from_metadata(&metadata, "_nodeVersion", "agent-browser", "0.9.1"),
            None
        );
    }

    #[test]
    #[ignore] // Requires network access
    fn resolves_agent_browser_node_version() {
        let fetcher = HttpFetcher::new(&crate::config::HttpSettings::default()).unwrap();
        let resolver = RegistryMetadataResolver::new(
            fetcher,
            "https://registry.npmjs.org/{package}/{version}",
            "agent-browser",
            "_nodeVersion",
        );
        assert!(resolver.resolve("0.9.1").is_some());
    }
}
