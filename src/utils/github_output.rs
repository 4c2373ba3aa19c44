use crate::error::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// Environment variable GitHub Actions points at the step output file.
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Append `name` as a multi-line step output, bounded by a random delimiter.
pub fn append_output(output_file: &Path, name: &str, value: &str) -> Result<()> {
    let delimiter = Uuid::new_v4().simple().to_string();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_file)?;
    write!(file, "{}", format_block(name, value, &delimiter))?;
    Ok(())
}

fn format_block(name: &str, value: &str, delimiter: &str) -> String {
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}
