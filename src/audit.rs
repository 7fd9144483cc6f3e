//! JSONL audit logging for dabcat
//!
//! Records every patch run to a JSONL file for later review.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::output::{PatchReport, Status};

/// Log level for audit entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Patched,
    #[serde(rename = "DRY_RUN")]
    DryRun,
    Failed,
}

impl From<Status> for LogLevel {
    fn from(status: Status) -> Self {
        match status {
            Status::Patched => LogLevel::Patched,
            Status::DryRun => LogLevel::DryRun,
            Status::Failed => LogLevel::Failed,
        }
    }
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    /// Timestamp of the run
    pub timestamp: DateTime<Utc>,

    pub level: LogLevel,

    /// Connector that was patched
    pub connector: String,

    /// Branches emitted
    pub branches: usize,

    /// Rules dropped as duplicates
    pub skipped: usize,

    /// Rules rejected while loading or compiling
    pub rejected: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,

    /// Short description of the outcome
    pub reason: String,
}

impl AuditEntry {
    /// Create a new audit entry from a run report
    pub fn new(report: &PatchReport) -> Self {
        let reason = match (&report.error, report.already_patched) {
            (Some(error), _) => error.clone(),
            (None, true) => "patched over an existing generated block".to_string(),
            (None, false) => format!("{} branch(es) generated", report.branches.len()),
        };

        Self {
            timestamp: Utc::now(),
            level: report.status.into(),
            connector: report.connector.clone(),
            branches: report.branches.len(),
            skipped: report.skipped.len(),
            rejected: report.rejected.len(),
            output_dir: report.output_dir.clone(),
            reason,
        }
    }
}

/// Audit logger
#[derive(Default)]
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            OpenOptions::new()
                .create(true)
                .append(true)
                .open(p)
                .ok()
                .map(BufWriter::new)
        });

        Self { writer }
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Log a run report
    pub fn log_report(&mut self, report: &PatchReport) -> Result<(), std::io::Error> {
        self.log(&AuditEntry::new(report))
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}
