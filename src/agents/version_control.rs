use crate::error::{PkgbumpError, Result};
use crate::utils::path_validator::PathValidator;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackOutcome {
    CheckedOut,
    Restored,
    Failed,
}

/// VersionControlAgent reverts patched descriptors through git.
pub struct VersionControlAgent {
    root: PathBuf,
}

impl VersionControlAgent {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Best-effort revert: `git checkout`, then `git restore`. Never fails the run.
    pub fn rollback(&self, descriptor: &Path) -> RollbackOutcome {
        let target = match self.validate_target(descriptor) {
            Ok(target) => target,
            Err(e) => {
                println!("{} Refusing to roll back: {e}", "Warning:".yellow());
                return RollbackOutcome::Failed;
            }
        };

        match self.git_file_command(&target, &["checkout", "--"]) {
            Ok(()) => {
                println!("Rolled back changes to {}", descriptor.display());
                return RollbackOutcome::CheckedOut;
            }
            Err(e) => println!(
                "{} Failed to rollback {}: {e}",
                "Warning:".yellow(),
                descriptor.display()
            ),
        }

        match self.git_file_command(&target, &["restore"]) {
            Ok(()) => {
                println!("Restored {} using git restore", descriptor.display());
                RollbackOutcome::Restored
            }
            Err(e) => {
                tracing::debug!("git restore failed: {e}");
                println!(
                    "{}",
                    format!(
                        "Could not restore {}, manual cleanup may be needed",
                        descriptor.display()
                    )
                    .red()
                );
                RollbackOutcome::Failed
            }
        }
    }

    fn validate_target(&self, descriptor: &Path) -> Result<PathBuf> {
        let path_str = descriptor.to_string_lossy();
        let dangerous = ['\n', '\r', '\0'];
        if let Some(ch) = dangerous.iter().find(|c| path_str.contains(**c)) {
            return Err(PkgbumpError::Descriptor(format!(
                "Path contains dangerous character: {:?}",
                ch
            )));
        }
        PathValidator::validate_file_path(descriptor, &self.root)
    }

    // Runs `git <args> <file name>` from the descriptor's directory so the
    // enclosing repository is picked up regardless of the working directory.
    fn git_file_command(&self, target: &Path, args: &[&str]) -> Result<()> {
        let (dir, file_name) = match (target.parent(), target.file_name()) {
            (Some(dir), Some(file_name)) => (dir, file_name),
            _ => {
                return Err(PkgbumpError::Descriptor(format!(
                    "'{}' is not a file path",
                    target.display()
                )));
            }
        };

        let output = Command::new("git")
            .current_dir(dir)
            .args(args)
            .arg(file_name)
            .output()
            .map_err(|e| {
                PkgbumpError::Descriptor(format!(
                    "Failed to execute git command '{}': {e}",
                    args.join(" ")
                ))
            })?;

        Self::ensure_success(&output, &format!("git {}", args[0]))
    }

    fn ensure_success(output: &Output, command: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }

        Err(PkgbumpError::Descriptor(format!(
            "{} failed: {}",
            command,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}
