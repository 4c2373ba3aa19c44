use colored::Colorize;
use std::path::Path;
use std::process::{Command, Output};

/// Recomputes the source checksums of a package directory.
pub trait ChecksumTool {
    fn refresh(&self, pkg_dir: &Path) -> bool;
}

/// ChecksumRefresherAgent runs `updpkgsums`, dropping to an unprivileged
/// build user via sudo when invoked as root (makepkg refuses to run as root).
pub struct ChecksumRefresherAgent {
    command: String,
    build_user: String,
}

impl ChecksumRefresherAgent {
    pub fn new(command: impl Into<String>, build_user: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            build_user: build_user.into(),
        }
    }

    fn is_root() -> bool {
        Command::new("id")
            .arg("-u")
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).trim() == "0")
            .unwrap_or(false)
    }

    fn command_line(&self, as_root: bool) -> Vec<&str> {
        if as_root {
            vec![
                "sudo",
                "-u",
                self.build_user.as_str(),
                self.command.as_str(),
            ]
        } else {
            vec![self.command.as_str()]
        }
    }

    fn run(&self, pkg_dir: &Path, argv: &[&str]) -> std::io::Result<Output> {
        tracing::debug!("running {} in {:?}", argv.join(" "), pkg_dir);
        Command::new(argv[0])
            .args(&argv[1..])
            .current_dir(pkg_dir)
            .output()
    }
}

impl ChecksumTool for ChecksumRefresherAgent {
    fn refresh(&self, pkg_dir: &Path) -> bool {
        println!("Updating checksums...");

        let argv = self.command_line(Self::is_root());
        match self.run(pkg_dir, &argv) {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                println!(
                    "{} {}",
                    "Error updating checksums:".red(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                false
            }
            Err(e) => {
                println!(
                    "{} failed to execute '{}': {e}",
                    "Error updating checksums:".red(),
                    argv.join(" ")
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn drops_privileges_when_root() {
        let agent = ChecksumRefresherAgent::new("updpkgsums", "builduser");
        assert_eq!(
            agent.command_line(true),
            vec!["sudo", "-u", "builduser", "updpkgsums"]
        );
        assert_eq!(agent.command_line(false), vec!["updpkgsums"]);
    }

    #[test]
    fn missing_command_reports_failure() {
        let dir = tempdir().unwrap();
        let agent = ChecksumRefresherAgent::new("pkgbump-no-such-tool", "builduser");
        assert!(!agent.refresh(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn successful_command_reports_success() {
        let dir = tempdir().unwrap();
        let agent = ChecksumRefresherAgent::new("true", "builduser");
        let argv = agent.command_line(false);
        let output = agent.run(dir.path(), &argv).unwrap();
        assert!(output.status.success());
    }
}
