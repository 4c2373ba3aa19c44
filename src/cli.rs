use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pkgbump",
    about = "Update PKGBUILD files from nvchecker results and refresh their checksums",
    version,
    author
)]
pub struct Cli {
    /// nvchecker result file (JSON or "<name> <version>" lines)
    #[arg(short, long, env = "PKGBUMP_REPORT", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Directory searched recursively for PKGBUILD files
    #[arg(long, env = "PKGBUMP_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Configuration file (defaults to ./pkgbump.toml when present)
    #[arg(short, long, env = "PKGBUMP_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where the generated commit message is written
    #[arg(long, value_name = "PATH")]
    pub commit_message: Option<PathBuf>,

    /// Unprivileged account used for checksum refresh when running as root
    #[arg(long, value_name = "USER")]
    pub build_user: Option<String>,

    /// Do not run updpkgsums after patching
    #[arg(long)]
    pub skip_checksums: bool,

    /// Exit with status 1 when the report lists packages but none were updated
    #[arg(long)]
    pub strict: bool,

    /// Show what would change without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}
