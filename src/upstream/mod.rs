use crate::config::HttpSettings;
use crate::error::{PkgbumpError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::time::Duration;
use url::Url;

pub mod factory;
pub mod registry;
pub mod tarball;
pub mod version;

pub use factory::ResolverFactory;
pub use registry::RegistryMetadataResolver;
pub use tarball::TarballLockfileResolver;

/// Derives a pinned sub-dependency version from a new upstream release.
///
/// Implementations never fail the run: lookup problems are reported as
/// warnings and surface as `None`, which makes the caller skip the package.
pub trait PinResolver {
    fn resolve(&self, version: &str) -> Option<String>;
}

/// Blocking HTTP client shared by the resolvers. Single attempt.
///
/// Connecting is bounded by `timeout_secs`. Small documents must arrive
/// within that same budget, release archives within `download_timeout_secs`.
pub struct HttpFetcher {
    client: Client,
    download_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.timeout())
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .danger_accept_invalid_certs(false)
            .build()
            .map_err(|e| PkgbumpError::Network(e.to_string()))?;
        Ok(Self {
            client,
            download_timeout: settings.download_timeout(),
        })
    }

    /// GET a metadata document, refusing bodies larger than `limit` bytes.
    pub fn fetch_bytes(&self, url: &Url, limit: usize) -> Result<Vec<u8>> {
        tracing::debug!("fetching {}", url);
        self.download(url, limit, None)
    }

    /// GET a release archive with the longer download deadline and a spinner.
    pub fn fetch_archive(&self, url: &Url, limit: usize) -> Result<Vec<u8>> {
        tracing::debug!("downloading {}", url);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Downloading {url}"));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = self.download(url, limit, Some(self.download_timeout));
        spinner.finish_and_clear();
        result
    }

    fn download(&self, url: &Url, limit: usize, deadline: Option<Duration>) -> Result<Vec<u8>> {
        let mut request = self.client.get(url.as_str());
        if let Some(deadline) = deadline {
            request = request.timeout(deadline);
        }
        let response = request
            .send()
            .map_err(|e| PkgbumpError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PkgbumpError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }

        if let Some(length) = response.content_length() {
            if length > limit as u64 {
                return Err(PkgbumpError::Network(format!(
                    "Response from {url} exceeds {limit} bytes"
                )));
            }
        }

        let bytes = response
            .bytes()
            .map_err(|e| PkgbumpError::Network(e.to_string()))?;

        if bytes.len() > limit {
            return Err(PkgbumpError::Network(format!(
                "Response from {url} exceeds {limit} bytes"
            )));
        }

        Ok(bytes.to_vec())
    }
}

/// Fill `{version}` and `{package}` placeholders and check the result is an
/// http(s) URL.
pub fn render_url(template: &str, version: &str, package: Option<&str>) -> Result<Url> {
    let mut rendered = template.replace("{version}", version);
    if let Some(package) = package {
        rendered = rendered.replace("{package}", package);
    }

    let parsed = Url::parse(&rendered)
        .map_err(|_| PkgbumpError::Config(format!("Invalid URL: {rendered}")))?;

    match parsed.scheme() {
        "https" | "http" => Ok(parsed),
        scheme => Err(PkgbumpError::Config(format!(
            "Unsupported URL scheme: {scheme}"
        ))),
    }
}
