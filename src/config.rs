use crate::cli::Cli;
use crate::error::{PkgbumpError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "pkgbump.toml";

/// Run settings, resolved from built-in defaults, `pkgbump.toml` and CLI flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub report: PathBuf,
    pub root: PathBuf,
    pub descriptor_name: String,
    pub commit_message: PathBuf,
    pub checksum_command: String,
    pub build_user: String,
    pub skip_checksums: bool,
    pub strict: bool,
    pub http: HttpSettings,
    pub pins: Vec<PinRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report: PathBuf::from("/tmp/newver.json"),
            root: PathBuf::from("src"),
            descriptor_name: "PKGBUILD".to_string(),
            commit_message: PathBuf::from("/tmp/commit_message.txt"),
            checksum_command: "updpkgsums".to_string(),
            build_user: "builduser".to_string(),
            skip_checksums: false,
            strict: false,
            http: HttpSettings::default(),
            pins: PinRule::builtin(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    /// Connect timeout, and total deadline for metadata requests.
    pub timeout_secs: u64,
    /// Total deadline for release archive downloads.
    pub download_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            download_timeout_secs: 300,
            user_agent: "pkgbump".to_string(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Binds the PKGBUILD living in `directory` to a pinned assignment whose
/// value is derived from the new upstream version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinRule {
    pub directory: String,
    pub key: String,
    #[serde(default)]
    pub quote: bool,
    pub source: PinSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PinSource {
    /// Version read from a lockfile inside the release source tarball.
    TarballLockfile {
        url: String,
        member_suffix: String,
        dependency: String,
    },
    /// Version read from a string field of npm registry metadata.
    RegistryMetadata {
        url: String,
        package: String,
        field: String,
    },
}

impl PinRule {
    pub fn builtin() -> Vec<PinRule> {
        vec![
            PinRule {
                directory: "wrangler".to_string(),
                key: "_esbuild_ver".to_string(),
                quote: true,
                source: PinSource::TarballLockfile {
                    url: "https://github.com/cloudflare/workers-sdk/archive/refs/tags/wrangler@{version}.tar.gz"
                        .to_string(),
                    member_suffix: "/pnpm-lock.yaml".to_string(),
                    dependency: "esbuild".to_string(),
                },
            },
            PinRule {
                directory: "agent-browser".to_string(),
                key: "_node_ver".to_string(),
                quote: false,
                source: PinSource::RegistryMetadata {
                    url: "https://registry.npmjs.org/{package}/{version}".to_string(),
                    package: "agent-browser".to_string(),
                    field: "_nodeVersion".to_string(),
                },
            },
        ]
    }
}

impl Config {
    /// Load configuration from an explicit file, or from `./pkgbump.toml`
    /// when it exists. An explicit path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(PkgbumpError::Config(format!(
                        "Config file '{}' not found",
                        path.display()
                    )));
                }
                Self::from_file(path)
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("loading pkgbump config from {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| {
            PkgbumpError::Config(format!("Failed to read '{}': {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.descriptor_name.trim().is_empty() {
            return Err(PkgbumpError::Config(
                "descriptor_name must not be empty".to_string(),
            ));
        }
        if self.http.timeout_secs == 0 || self.http.download_timeout_secs == 0 {
            return Err(PkgbumpError::Config(
                "http timeouts must be greater than zero".to_string(),
            ));
        }
        for pin in &self.pins {
            if pin.key.is_empty() || pin.directory.is_empty() {
                return Err(PkgbumpError::Config(
                    "pins entries need a non-empty directory and key".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Command-line flags take precedence over file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(report) = &cli.report {
            self.report = report.clone();
        }
        if let Some(root) = &cli.root {
            self.root = root.clone();
        }
        if let Some(commit_message) = &cli.commit_message {
            self.commit_message = commit_message.clone();
        }
        if let Some(build_user) = &cli.build_user {
            self.build_user = build_user.clone();
        }
        self.skip_checksums |= cli.skip_checksums;
        self.strict |= cli.strict;
    }
}
