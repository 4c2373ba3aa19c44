use crate::error::{PkgbumpError, Result};
use crate::utils::path_validator::PathValidator;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// DescriptorLocator finds the PKGBUILD declaring a given package name
pub struct DescriptorLocator {
    root: PathBuf,
    file_name: String,
}

impl DescriptorLocator {
    pub fn new<P: AsRef<Path>>(root: P, file_name: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            file_name: file_name.into(),
        }
    }

    /// Returns the first descriptor (in file-name order) containing the line
    /// `pkgname=<name>`, or `None` when no descriptor declares it.
    pub fn find(&self, pkg_name: &str) -> Result<Option<PathBuf>> {
        if !self.root.exists() {
            tracing::debug!("package root {:?} does not exist", self.root);
            return Ok(None);
        }
        let root = PathValidator::validate_root(&self.root)?;

        let pattern = Regex::new(&format!(r"(?m)^pkgname={}$", regex::escape(pkg_name)))
            .map_err(|e| {
                PkgbumpError::Descriptor(format!("Invalid package name '{pkg_name}': {e}"))
            })?;

        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("skipping unreadable entry: {e}");
                    continue;
                }
            };

            if !entry.file_type().is_file() || entry.file_name() != self.file_name.as_str() {
                continue;
            }

            let content = match fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) => {
                    tracing::debug!("cannot read {:?}: {e}", entry.path());
                    continue;
                }
            };

            if pattern.is_match(&content) {
                return Ok(Some(self.relative_to_root(&root, entry.path())));
            }
        }

        Ok(None)
    }

    // Report paths under the configured root rather than the canonical one.
    fn relative_to_root(&self, canonical_root: &Path, found: &Path) -> PathBuf {
        found
            .strip_prefix(canonical_root)
            .map(|relative| self.root.join(relative))
            .unwrap_or_else(|_| found.to_path_buf())
    }
}
