use crate::error::{PkgbumpError, Result};
use std::path::{Path, PathBuf};

/// Path checks keeping file operations inside the package tree.
pub struct PathValidator;

impl PathValidator {
    /// Validates and canonicalises the directory holding the package tree.
    pub fn validate_root(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let canonical = path.canonicalize().map_err(|e| {
            PkgbumpError::Config(format!("Invalid path '{}': {e}", path.display()))
        })?;

        if !canonical.is_dir() {
            return Err(PkgbumpError::Config(format!(
                "Path '{}' is not a directory",
                canonical.display()
            )));
        }

        Ok(canonical)
    }

    /// Ensures the file path resides inside the provided base directory.
    pub fn validate_file_path(
        file_path: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let file_path = file_path.as_ref();
        let base_dir = base_dir.as_ref();

        let canonical_file = file_path.canonicalize().map_err(|e| {
            PkgbumpError::Descriptor(format!("Invalid file path '{}': {e}", file_path.display()))
        })?;

        let canonical_base = base_dir.canonicalize().map_err(|e| {
            PkgbumpError::Descriptor(format!(
                "Invalid base directory '{}': {e}",
                base_dir.display()
            ))
        })?;

        if !canonical_file.starts_with(&canonical_base) {
            return Err(PkgbumpError::Descriptor(format!(
                "'{}' is outside the package tree",
                file_path.display()
            )));
        }

        Ok(canonical_file)
    }
}
