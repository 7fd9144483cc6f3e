//! Run report
//!
//! Produces the JSON summary printed after a patch run.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use crate::engine::compiler::{Branch, SkippedRule};
use crate::engine::Patch;
use crate::error::PatchError;
use crate::package::AppIdentity;
use crate::session::RuleFailure;

/// Outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Patched project written to disk
    Patched,
    /// Patched text printed, nothing written
    DryRun,
    /// Nothing patched
    Failed,
}

/// A rule that did not make it into the block
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRule {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
    pub reason: String,
}

/// Report for one run
#[derive(Debug, Clone, Serialize)]
pub struct PatchReport {
    pub status: Status,

    /// Connector path
    pub connector: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_line: Option<usize>,

    pub branches: Vec<Branch>,

    /// Rules dropped because their action already had a branch
    pub skipped: Vec<SkippedRule>,

    /// Rules that failed to load or compile
    pub rejected: Vec<RejectedRule>,

    pub already_patched: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<AppIdentity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PatchReport {
    /// Report for a failed run
    pub fn failed(connector: &Path, reason: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            connector: connector.display().to_string(),
            anchor_line: None,
            branches: Vec::new(),
            skipped: Vec::new(),
            rejected: Vec::new(),
            already_patched: false,
            output_dir: None,
            archive: None,
            identity: None,
            error: Some(reason.into()),
        }
    }

    /// Report for a successful synthesis, before anything is written
    pub fn from_patch(connector: &Path, patch: &Patch) -> Self {
        Self {
            status: Status::DryRun,
            connector: connector.display().to_string(),
            anchor_line: Some(patch.anchor.line),
            branches: patch.branches.clone(),
            skipped: patch.skipped.clone(),
            rejected: patch.rejected.iter().map(rejected_from_error).collect(),
            already_patched: patch.already_patched,
            output_dir: None,
            archive: None,
            identity: None,
            error: None,
        }
    }

    /// Add rules that failed before reaching the engine
    ///
    /// Their index is the position in the batch file, not in the accepted
    /// rule list the engine saw.
    pub fn with_load_failures(mut self, failures: &[RuleFailure]) -> Self {
        self.rejected.extend(failures.iter().map(|f| RejectedRule {
            index: f.index,
            data_file: Some(f.data_file.display().to_string()),
            reason: f.error.to_string(),
        }));
        self
    }

    /// Mark the run as written to `output_dir`
    pub fn with_output(mut self, output_dir: &Path, identity: AppIdentity) -> Self {
        self.status = Status::Patched;
        self.output_dir = Some(output_dir.display().to_string());
        self.identity = Some(identity);
        self
    }

    /// Record the archive written for the output directory
    pub fn with_archive(mut self, archive: &Path) -> Self {
        self.archive = Some(archive.display().to_string());
        self
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Write patched connector text, surfacing short writes and failed flushes
pub fn write_patched<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

fn rejected_from_error(error: &PatchError) -> RejectedRule {
    let index = match error {
        PatchError::MalformedRule { index, .. } | PatchError::SubstitutionCollision { index, .. } => {
            *index
        }
        _ => 0,
    };
    RejectedRule {
        index,
        data_file: None,
        reason: error.to_string(),
    }
}
