use crate::agents::{
    ChangeLog, ChecksumRefresherAgent, ChecksumTool, DescriptorLocator, DescriptorPatcher,
    PatchOutcome, PinBinding, ReportReaderAgent, RollbackOutcome, VersionControlAgent,
    VersionReport,
};
use crate::config::Config;
use crate::error::Result;
use crate::upstream::ResolverFactory;
use crate::utils::github_output::{GITHUB_OUTPUT_ENV, append_output};
use colored::Colorize;
use std::path::Path;

/// What happened to one package of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    Updated { old_version: String },
    Unchanged,
    NotFound,
    Skipped(String),
    ChecksumFailed(RollbackOutcome),
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(String, PackageOutcome)>,
    pub change_log: ChangeLog,
}

impl RunSummary {
    pub fn requested(&self) -> usize {
        self.outcomes.len()
    }

    /// 0 unless `strict` and a non-empty report produced no update.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if strict && self.requested() > 0 && self.change_log.is_empty() {
            1
        } else {
            0
        }
    }
}

/// Sequences locate, patch, checksum refresh and rollback for every package.
pub struct UpdateWorkflow {
    locator: DescriptorLocator,
    patcher: DescriptorPatcher,
    checksums: Option<Box<dyn ChecksumTool>>,
    version_control: VersionControlAgent,
    dry_run: bool,
}

impl UpdateWorkflow {
    pub fn from_config(config: &Config, dry_run: bool) -> Result<Self> {
        let pins = config
            .pins
            .iter()
            .map(|rule| {
                ResolverFactory::create(&rule.source, &config.http)
                    .map(|resolver| PinBinding::new(rule.clone(), resolver))
            })
            .collect::<Result<Vec<_>>>()?;

        let checksums: Option<Box<dyn ChecksumTool>> = if config.skip_checksums {
            None
        } else {
            Some(Box::new(ChecksumRefresherAgent::new(
                config.checksum_command.as_str(),
                config.build_user.as_str(),
            )))
        };

        Ok(Self::with_agents(
            DescriptorLocator::new(&config.root, config.descriptor_name.as_str()),
            DescriptorPatcher::new(pins),
            checksums,
            VersionControlAgent::new(&config.root),
            dry_run,
        ))
    }

    fn with_agents(
        locator: DescriptorLocator,
        patcher: DescriptorPatcher,
        checksums: Option<Box<dyn ChecksumTool>>,
        version_control: VersionControlAgent,
        dry_run: bool,
    ) -> Self {
        Self {
            locator,
            patcher,
            checksums,
            version_control,
            dry_run,
        }
    }

    /// Process every package in report order. Per-package failures become
    /// outcomes and never abort the loop.
    pub fn run(&self, report: &VersionReport) -> RunSummary {
        let mut summary = RunSummary::default();

        for (pkg_name, version) in report {
            println!("\n{}", format!("Processing {pkg_name}...").cyan().bold());

            let outcome = match self.process(pkg_name, version) {
                Ok(outcome) => outcome,
                Err(e) => {
                    println!("{} {e}", "Warning:".yellow());
                    PackageOutcome::Skipped(e.to_string())
                }
            };

            if let PackageOutcome::Updated { old_version } = &outcome {
                summary.change_log.record(pkg_name, old_version, version);
            }
            summary.outcomes.push((pkg_name.clone(), outcome));
        }

        summary
    }

    fn process(&self, pkg_name: &str, new_version: &str) -> Result<PackageOutcome> {
        let Some(descriptor) = self.locator.find(pkg_name)? else {
            println!("{} PKGBUILD not found for {pkg_name}", "Warning:".yellow());
            return Ok(PackageOutcome::NotFound);
        };
        tracing::debug!("{} -> {:?}", pkg_name, descriptor);

        let outcome = if self.dry_run {
            self.patcher.prepare(&descriptor, new_version)?
        } else {
            self.patcher.patch(&descriptor, new_version)?
        };

        let old_version = match outcome {
            PatchOutcome::Updated { old_version, .. } => old_version,
            PatchOutcome::Unchanged { version } => {
                println!("Already at version {version} (skipping)");
                return Ok(PackageOutcome::Unchanged);
            }
            PatchOutcome::Skipped { reason } => {
                println!("{} {reason}, skip this package", "Warning:".yellow());
                return Ok(PackageOutcome::Skipped(reason));
            }
        };

        println!("Updating: {} -> {}", old_version.red(), new_version.green());

        if self.dry_run {
            return Ok(PackageOutcome::Updated { old_version });
        }

        if let Some(checksums) = &self.checksums {
            let pkg_dir = descriptor.parent().unwrap_or_else(|| Path::new("."));
            if !checksums.refresh(pkg_dir) {
                let rollback = self.version_control.rollback(&descriptor);
                return Ok(PackageOutcome::ChecksumFailed(rollback));
            }
        }

        Ok(PackageOutcome::Updated { old_version })
    }
}

/// Write the commit message and, when running in GitHub Actions, expose it
/// as the `message` step output.
pub fn publish_change_log(
    change_log: &ChangeLog,
    commit_message_path: &Path,
    github_output: Option<&Path>,
) -> Result<()> {
    change_log.write_commit_message(commit_message_path)?;
    if let Some(output) = github_output {
        append_output(output, "message", &change_log.commit_message())?;
    }
    Ok(())
}

/// Execute the update run; returns the process exit code.
pub fn execute_update(config: &Config, dry_run: bool) -> Result<i32> {
    let report = ReportReaderAgent::new(&config.report).read()?;
    if report.is_empty() {
        return Ok(0);
    }

    println!(
        "{}",
        format!("Found {} package(s) to update", report.len())
            .cyan()
            .bold()
    );
    for (name, version) in &report {
        println!("   • {} {}", name.bright_cyan(), version.dimmed());
    }

    let workflow = UpdateWorkflow::from_config(config, dry_run)?;
    let summary = workflow.run(&report);

    print_summary(&summary, dry_run);

    if !summary.change_log.is_empty() && !dry_run {
        let github_output = std::env::var_os(GITHUB_OUTPUT_ENV)
            .filter(|value| !value.is_empty())
            .map(std::path::PathBuf::from);
        publish_change_log(
            &summary.change_log,
            &config.commit_message,
            github_output.as_deref(),
        )?;
    }

    Ok(summary.exit_code(config.strict))
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    let count = summary.change_log.len();
    if count == 0 {
        println!(
            "\n{}",
            "No packages were updated (all packages already at detected versions)".yellow()
        );
    } else if dry_run {
        println!(
            "\n{}",
            format!("Would update {count} package(s)").green().bold()
        );
    } else {
        println!(
            "\n{}",
            format!("Successfully updated {count} package(s)")
                .green()
                .bold()
        );
    }

    for record in summary.change_log.records() {
        println!(
            "  • {} {} → {}",
            record.package.white().bold(),
            record.old_version.red(),
            record.new_version.green()
        );
    }

    let failed: Vec<_> = summary
        .outcomes
        .iter()
        .filter(|(_, outcome)| {
            matches!(
                outcome,
                PackageOutcome::Skipped(_) | PackageOutcome::ChecksumFailed(_)
            )
        })
        .map(|(name, _)| name.as_str())
        .collect();
    if !failed.is_empty() {
        println!("{} {}", "Skipped:".yellow(), failed.join(", "));
    }
}
