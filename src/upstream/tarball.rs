use super::version::strip_quotes;
use super::{HttpFetcher, PinResolver, render_url};
use crate::error::{PkgbumpError, Result};
use colored::Colorize;
use flate2::read::GzDecoder;
use regex::Regex;
use std::io::Read;

const MAX_ARCHIVE_BYTES: usize = 64 * 1024 * 1024;

/// Reads a pinned dependency version from the lockfile shipped in a release
/// source tarball (e.g. the esbuild version in wrangler's `pnpm-lock.yaml`).
pub struct TarballLockfileResolver {
    fetcher: HttpFetcher,
    url_template: String,
    member_suffix: String,
    dependency: String,
}

impl TarballLockfileResolver {
    pub fn new(
        fetcher: HttpFetcher,
        url_template: impl Into<String>,
        member_suffix: impl Into<String>,
        dependency: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            url_template: url_template.into(),
            member_suffix: member_suffix.into(),
            dependency: dependency.into(),
        }
    }
}

impl PinResolver for TarballLockfileResolver {
    fn resolve(&self, version: &str) -> Option<String> {
        let url = match render_url(&self.url_template, version, None) {
            Ok(url) => url,
            Err(e) => {
                println!("{} {e}", "Warning:".yellow());
                return None;
            }
        };

        let archive = match self.fetcher.fetch_archive(&url, MAX_ARCHIVE_BYTES) {
            Ok(bytes) => bytes,
            Err(e) => {
                println!(
                    "{} Failed to download source tarball: {e}",
                    "Warning:".yellow()
                );
                return None;
            }
        };

        let lockfile = match read_member(&archive, &self.member_suffix) {
            Ok(Some(content)) => content,
            Ok(None) => {
                println!(
                    "{} Cannot find *{} in source tarball",
                    "Warning:".yellow(),
                    self.member_suffix
                );
                return None;
            }
            Err(e) => {
                println!(
                    "{} Failed to unpack source tarball: {e}",
                    "Warning:".yellow()
                );
                return None;
            }
        };

        let pinned = extract_catalog_version(&lockfile, &self.dependency);
        if pinned.is_none() {
            println!(
                "{} No {} entry in the default catalog of {}",
                "Warning:".yellow(),
                self.dependency,
                self.member_suffix.trim_start_matches('/')
            );
        }
        pinned
    }
}

/// Return the first member of a gzipped tarball whose path ends with
/// `suffix`, decoded lossily as UTF-8.
pub fn read_member(archive: &[u8], suffix: &str) -> Result<Option<String>> {
    let mut archive = tar::Archive::new(GzDecoder::new(archive));
    let entries = archive
        .entries()
        .map_err(|e| PkgbumpError::Archive(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| PkgbumpError::Archive(e.to_string()))?;
        let path = entry
            .path()
            .map_err(|e| PkgbumpError::Archive(e.to_string()))?
            .to_string_lossy()
            .into_owned();

        if !path.ends_with(suffix) {
            continue;
        }

        tracing::debug!("reading {} from archive", path);
        let mut buffer = Vec::new();
        entry
            .read_to_end(&mut buffer)
            .map_err(|e| PkgbumpError::Archive(e.to_string()))?;
        return Ok(Some(String::from_utf8_lossy(&buffer).into_owned()));
    }

    Ok(None)
}

/// Pull `catalogs.default.<dependency>.version` out of a pnpm lockfile.
pub fn extract_catalog_version(lockfile: &str, dependency: &str) -> Option<String> {
    let pattern = format!(
        concat!(
            r"catalogs:\n\s+default:\n(?:.*\n){{0,40}}?",
            r"\s+{}:\n\s+specifier:\s*[^\n]+\n\s+version:\s*([^\n]+)",
        ),
        regex::escape(dependency)
    );
    let re = Regex::new(&pattern).ok()?;
    let captures = re.captures(lockfile)?;
    let version = strip_quotes(captures.get(1)?.as_str());
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}
