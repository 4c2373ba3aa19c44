use crate::config::PinRule;
use crate::error::{PkgbumpError, Result};
use crate::upstream::PinResolver;
use crate::upstream::version::strip_quotes;
use regex::{NoExpand, Regex};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Result of patching one PKGBUILD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// `patched` is the full new file content.
    Updated {
        old_version: String,
        patched: String,
    },
    Unchanged {
        version: String,
    },
    Skipped {
        reason: String,
    },
}

/// A pin rule together with the resolver computing its value.
#[derive(Clone)]
pub struct PinBinding {
    pub rule: PinRule,
    pub resolver: Arc<dyn PinResolver>,
}

impl PinBinding {
    pub fn new(rule: PinRule, resolver: Arc<dyn PinResolver>) -> Self {
        Self { rule, resolver }
    }
}

/// DescriptorPatcher rewrites pkgver/pkgrel and pinned assignments.
///
/// Every substitution is done in memory; the file is written once, after
/// all of them succeeded, so a skipped package leaves the file untouched.
pub struct DescriptorPatcher {
    pins: Vec<PinBinding>,
}

impl DescriptorPatcher {
    pub fn new(pins: Vec<PinBinding>) -> Self {
        Self { pins }
    }

    /// Compute the patched content without writing it.
    pub fn prepare(&self, descriptor: &Path, new_version: &str) -> Result<PatchOutcome> {
        let content = fs::read_to_string(descriptor).map_err(|e| {
            PkgbumpError::Descriptor(format!("Failed to read '{}': {e}", descriptor.display()))
        })?;

        let Some(current) = current_version(&content) else {
            return Ok(PatchOutcome::Skipped {
                reason: format!("Cannot find pkgver in {}", descriptor.display()),
            });
        };

        if current == new_version {
            return Ok(PatchOutcome::Unchanged { version: current });
        }

        let mut patched = replace_assignment(&content, "pkgver", new_version).ok_or_else(|| {
            PkgbumpError::Descriptor(format!("pkgver vanished from {}", descriptor.display()))
        })?;

        if let Some(reset) = replace_assignment(&patched, "pkgrel", "1") {
            patched = reset;
        } else {
            tracing::debug!("{:?} has no pkgrel to reset", descriptor);
        }

        let directory = descriptor
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        for binding in self.pins.iter().filter(|b| b.rule.directory == directory) {
            let rule = &binding.rule;
            let Some(pinned) = binding.resolver.resolve(new_version) else {
                return Ok(PatchOutcome::Skipped {
                    reason: format!("Cannot detect {} for {directory} {new_version}", rule.key),
                });
            };

            let value = if rule.quote {
                format!("'{pinned}'")
            } else {
                pinned
            };

            match replace_assignment(&patched, &rule.key, &value) {
                Some(next) => patched = next,
                None => {
                    return Ok(PatchOutcome::Skipped {
                        reason: format!("Cannot find {} in {}", rule.key, descriptor.display()),
                    });
                }
            }
        }

        Ok(PatchOutcome::Updated {
            old_version: current,
            patched,
        })
    }

    /// Patch the descriptor in place.
    pub fn patch(&self, descriptor: &Path, new_version: &str) -> Result<PatchOutcome> {
        let outcome = self.prepare(descriptor, new_version)?;
        if let PatchOutcome::Updated { patched, .. } = &outcome {
            fs::write(descriptor, patched)?;
        }
        Ok(outcome)
    }
}

fn assignment_pattern(key: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?m)^{}=.+$", regex::escape(key))).ok()
}

/// Value of the first `pkgver=` line with surrounding quotes removed.
pub fn current_version(content: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^pkgver=(.+)$").ok()?;
    let captures = re.captures(content)?;
    Some(strip_quotes(captures.get(1)?.as_str()).to_string())
}

/// Replace the first `<key>=...` line with `<key>=<value>`.
/// Returns `None` when no such line exists.
pub fn replace_assignment(content: &str, key: &str, value: &str) -> Option<String> {
    let re = assignment_pattern(key)?;
    if !re.is_match(content) {
        return None;
    }
    let line = format!("{key}={value}");
    Some(re.replacen(content, 1, NoExpand(&line)).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinSource;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::tempdir;

    const FOO: &str = concat!(
        "# Maintainer: someone\n",
        "pkgname=foo\n",
        "pkgver=1.0\n",
        "pkgrel=3\n",
        "arch=('x86_64')\n",
        "source=(\"https://example.com/foo-$pkgver.tar.gz\")\n",
    );

    struct StubResolver {
        answer: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubResolver {
        fn new(answer: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.map(str::to_string),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl PinResolver for StubResolver {
        fn resolve(&self, version: &str) -> Option<String> {
            self.calls.lock().unwrap().push(version.to_string());
            self.answer.clone()
        }
    }

    fn rule(directory: &str, key: &str, quote: bool) -> PinRule {
        PinRule {
            directory: directory.to_string(),
            key: key.to_string(),
            quote,
            source: PinSource::RegistryMetadata {
                url: "https://registry.npmjs.org/{package}/{version}".to_string(),
                package: directory.to_string(),
                field: "_nodeVersion".to_string(),
            },
        }
    }

    fn write_descriptor(root: &Path, dir: &str, content: &str) -> PathBuf {
        let pkg_dir = root.join(dir);
        fs::create_dir_all(&pkg_dir).unwrap();
        let path = pkg_dir.join("PKGBUILD");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_current_version() {
        assert_eq!(current_version(FOO), Some("1.0".to_string()));
        assert_eq!(current_version("pkgver='2.1'\n"), Some("2.1".to_string()));
        assert_eq!(current_version("_pkgver=1\n"), None);
    }

    #[test]
    fn replaces_only_first_anchored_line() {
        let content = "pkgrel=2\n  pkgrel=5\npkgrel=7\n";
        assert_eq!(
            replace_assignment(content, "pkgrel", "1").unwrap(),
            "pkgrel=1\n  pkgrel=5\npkgrel=7\n"
        );
        assert_eq!(replace_assignment("pkgname=foo\n", "pkgrel", "1"), None);
    }

    #[test]
    fn replacement_value_is_literal() {
        let patched = replace_assignment("pkgver=1.0\n", "pkgver", "$1.2").unwrap();
        assert_eq!(patched, "pkgver=$1.2\n");
    }

    #[test]
    fn updates_version_and_resets_release() {
        let dir = tempdir().unwrap();
        let path = write_descriptor(dir.path(), "foo", FOO);

        let outcome = DescriptorPatcher::new(Vec::new())
            .patch(&path, "2.0")
            .unwrap();
        match outcome {
            PatchOutcome::Updated { old_version, .. } => assert_eq!(old_version, "1.0"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\npkgver=2.0\n"));
        assert!(written.contains("\npkgrel=1\n"));
        assert!(written.contains("foo-$pkgver.tar.gz"));
    }

    #[test]
    fn same_version_is_unchanged_and_idempotent() {
        let dir = tempdir().unwrap();
        let path = write_descriptor(dir.path(), "foo", FOO);
        let patcher = DescriptorPatcher::new(Vec::new());

        patcher.patch(&path, "2.0").unwrap();
        let after_first = fs::read_to_string(&path).unwrap();

        let outcome = patcher.patch(&path, "2.0").unwrap();
        assert_eq!(
            outcome,
            PatchOutcome::Unchanged {
                version: "2.0".to_string()
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn missing_pkgver_is_skipped() {
        let dir = tempdir().unwrap();
        let path = write_descriptor(dir.path(), "foo", "pkgname=foo\npkgrel=1\n");

        let outcome = DescriptorPatcher::new(Vec::new())
            .patch(&path, "2.0")
            .unwrap();
        assert!(matches!(outcome, PatchOutcome::Skipped { .. }));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "pkgname=foo\npkgrel=1\n"
        );
    }

    #[test]
    fn applies_quoted_pin_for_matching_directory() {
        let dir = tempdir().unwrap();
        let original = "pkgname=wrangler\npkgver=4.0.0\npkgrel=2\n_esbuild_ver='0.24.0'\n";
        let path = write_descriptor(dir.path(), "wrangler", original);

        let resolver = StubResolver::new(Some("0.24.2"));
        let patcher = DescriptorPatcher::new(vec![PinBinding::new(
            rule("wrangler", "_esbuild_ver", true),
            resolver.clone(),
        )]);

        patcher.patch(&path, "4.1.0").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "pkgname=wrangler\npkgver=4.1.0\npkgrel=1\n_esbuild_ver='0.24.2'\n"
        );
        assert_eq!(*resolver.calls.lock().unwrap(), vec!["4.1.0".to_string()]);
    }

    #[test]
    fn applies_unquoted_pin() {
        let dir = tempdir().unwrap();
        let original = "pkgname=agent-browser\npkgver=0.8.0\npkgrel=1\n_node_ver=20.0.0\n";
        let path = write_descriptor(dir.path(), "agent-browser", original);

        let patcher = DescriptorPatcher::new(vec![PinBinding::new(
            rule("agent-browser", "_node_ver", false),
            StubResolver::new(Some("22.14.0")),
        )]);

        patcher.patch(&path, "0.9.1").unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n_node_ver=22.14.0\n"));
    }

    #[test]
    fn failed_pin_lookup_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let original = "pkgname=wrangler\npkgver=4.0.0\npkgrel=2\n_esbuild_ver='0.24.0'\n";
        let path = write_descriptor(dir.path(), "wrangler", original);

        let patcher = DescriptorPatcher::new(vec![PinBinding::new(
            rule("wrangler", "_esbuild_ver", true),
            StubResolver::new(None),
        )]);

        let outcome = patcher.patch(&path, "4.1.0").unwrap();
        assert!(matches!(outcome, PatchOutcome::Skipped { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn missing_pin_key_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let original = "pkgname=wrangler\npkgver=4.0.0\npkgrel=2\n";
        let path = write_descriptor(dir.path(), "wrangler", original);

        let patcher = DescriptorPatcher::new(vec![PinBinding::new(
            rule("wrangler", "_esbuild_ver", true),
            StubResolver::new(Some("0.24.2")),
        )]);

        let outcome = patcher.patch(&path, "4.1.0").unwrap();
        assert!(matches!(outcome, PatchOutcome::Skipped { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn pins_for_other_directories_are_not_consulted() {
        let dir = tempdir().unwrap();
        let path = write_descriptor(dir.path(), "foo", FOO);

        let resolver = StubResolver::new(None);
        let patcher = DescriptorPatcher::new(vec![PinBinding::new(
            rule("wrangler", "_esbuild_ver", true),
            resolver.clone(),
        )]);

        let outcome = patcher.patch(&path, "2.0").unwrap();
        assert!(matches!(outcome, PatchOutcome::Updated { .. }));
        assert!(resolver.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn prepare_does_not_write() {
        let dir = tempdir().unwrap();
        let path = write_descriptor(dir.path(), "foo", FOO);

        let outcome = DescriptorPatcher::new(Vec::new())
            .prepare(&path, "2.0")
            .unwrap();
        assert!(matches!(outcome, PatchOutcome::Updated { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), FOO);
    }
}
