use crate::error::{PkgbumpError, Result};
use colored::Colorize;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Package name to target version, in report order.
pub type VersionReport = IndexMap<String, String>;

/// nvchecker v2 output: `{"version": 2, "data": {"pkg": {"version": "1.0"}}}`
#[derive(Debug, Deserialize)]
struct Envelope {
    data: IndexMap<String, EnvelopeEntry>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeEntry {
    version: String,
}

/// ReportReaderAgent loads the nvchecker result file
pub struct ReportReaderAgent {
    report_path: PathBuf,
}

impl ReportReaderAgent {
    pub fn new<P: AsRef<Path>>(report_path: P) -> Self {
        Self {
            report_path: report_path.as_ref().to_path_buf(),
        }
    }

    /// A missing report means there is nothing to update.
    pub fn read(&self) -> Result<VersionReport> {
        if !self.report_path.exists() {
            println!("{}", "No updates needed".green());
            return Ok(VersionReport::new());
        }

        let content = fs::read_to_string(&self.report_path).map_err(|e| {
            PkgbumpError::ReportParsing(format!(
                "Failed to read '{}': {e}",
                self.report_path.display()
            ))
        })?;

        parse_report(&content)
    }
}

pub fn parse_report(content: &str) -> Result<VersionReport> {
    let content = content.trim();

    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(content) {
        if object.contains_key("data") {
            let envelope: Envelope = serde_json::from_str(content).map_err(|e| {
                PkgbumpError::ReportParsing(format!("Malformed nvchecker JSON report: {e}"))
            })?;
            return Ok(envelope
                .data
                .into_iter()
                .map(|(name, entry)| (name, entry.version))
                .collect());
        }
        tracing::debug!("JSON report without a data envelope, falling back to line format");
    }

    parse_lines(content)
}

fn parse_lines(content: &str) -> Result<VersionReport> {
    let mut updates = VersionReport::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (name, version) = line.split_once(char::is_whitespace).ok_or_else(|| {
            PkgbumpError::ReportParsing(format!("Line {} has no version: '{line}'", index + 1))
        })?;

        updates.insert(name.to_string(), version.trim().to_string());
    }

    Ok(updates)
}
