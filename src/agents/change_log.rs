use crate::error::Result;
use std::fs;
use std::path::Path;

const COMMIT_SUBJECT: &str = "chore: update package versions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    pub package: String,
    pub old_version: String,
    pub new_version: String,
}

/// Packages updated during a run, in processing order.
#[derive(Debug, Default, Clone)]
pub struct ChangeLog {
    records: Vec<UpdateRecord>,
}

impl ChangeLog {
    pub fn record(
        &mut self,
        package: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
    ) {
        self.records.push(UpdateRecord {
            package: package.into(),
            old_version: old_version.into(),
            new_version: new_version.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[UpdateRecord] {
        &self.records
    }

    pub fn commit_message(&self) -> String {
        let body: Vec<String> = self
            .records
            .iter()
            .map(|r| format!("{} to {}", r.package, r.new_version))
            .collect();
        format!("{COMMIT_SUBJECT}\n\n{}", body.join("\n"))
    }

    pub fn write_commit_message(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.commit_message())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn renders_one_line_per_package() {
        let mut log = ChangeLog::default();
        log.record("foo", "1.0", "2.0");
        log.record("wrangler", "4.0.0", "4.1.0");

        assert_eq!(
            log.commit_message(),
            "chore: update package versions\n\nfoo to 2.0\nwrangler to 4.1.0"
        );
        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].old_version, "1.0");
    }

    #[test]
    fn writes_message_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/commit_message.txt");
        let mut log = ChangeLog::default();
        log.record("foo", "1.0", "2.0");

        log.write_commit_message(&path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().ends_with("foo to 2.0"));
    }
}
