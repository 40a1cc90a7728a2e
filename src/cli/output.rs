//! CLI output: transfer reports and error mapping to the CLI surface.

use crate::error::SyncError;
use crate::session::default_credentials_dir;
use crate::tree::diff::Diff;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Kind of a reported mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Mark {
    #[serde(rename = "D")]
    Delete,
    #[serde(rename = "C")]
    Create,
    #[serde(rename = "S")]
    Save,
}

impl Mark {
    pub fn letter(self) -> &'static str {
        match self {
            Mark::Delete => "D",
            Mark::Create => "C",
            Mark::Save => "S",
        }
    }
}

/// One applied mutation, addressed by its user-facing path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub mark: Mark,
    pub path: String,
}

/// Machine-readable summary of one transfer.
#[derive(Debug, Serialize)]
pub struct TransferReport<'a> {
    pub direction: &'a str,
    pub target: String,
    pub local_path: String,
    pub diff: &'a Diff,
    pub applied: &'a [ReportLine],
}

/// Deletions first, then created directories, then saved files.
pub fn format_report_text(lines: &[ReportLine], color: bool) -> String {
    let mut ordered: Vec<&ReportLine> = lines.iter().collect();
    ordered.sort_by_key(|line| line.mark);
    ordered
        .iter()
        .map(|line| {
            let letter = line.mark.letter();
            if !color {
                return format!("{} {}", letter, line.path);
            }
            match line.mark {
                Mark::Delete => format!("{} {}", letter.red().bold(), line.path),
                Mark::Create => format!("{} {}", letter.blue().bold(), line.path),
                Mark::Save => format!("{} {}", letter.green().bold(), line.path),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_report_json(report: &TransferReport<'_>) -> Result<String, SyncError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| SyncError::Config(format!("Failed to serialize report: {}", e)))
}

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &SyncError) -> String {
    match e {
        SyncError::LoginRequired => {
            let location = default_credentials_dir()
                .map(|dir| format!(" in {}", dir.display()))
                .unwrap_or_default();
            format!("Login required: store your name and session cookie{}", location)
        }
        other => other.to_string(),
    }
}
