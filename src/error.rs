//! Error types for dabcat
//!
//! `PatchError` covers the patch pipeline itself. `LoadError` covers the
//! collaborators that read connector projects, rule files and data documents.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PatchError>;

/// Errors raised while synthesizing a patch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// No handler-entry line in the connector source
    #[error("anchor not found: no line matches `{pattern}` ({hint})")]
    AnchorNotFound { pattern: String, hint: String },

    /// More than one handler-entry line (strict mode only)
    #[error("ambiguous anchor: {count} lines match `{pattern}` (lines {lines:?})")]
    AmbiguousAnchor {
        pattern: String,
        count: usize,
        lines: Vec<usize>,
    },

    /// Splice offset past the end of the source
    #[error("splice offset {offset} out of range for text of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// A rule whose guard fields disagree with `use_for_all`, or that names
    /// an action/parameter the catalog does not declare
    #[error("malformed rule #{index} for action '{action_id}': {reason}")]
    MalformedRule {
        index: usize,
        action_id: String,
        reason: String,
    },

    /// A payload would be corrupted by the token rewriter or the splice quoting
    #[error("substitution collision in rule #{index} for action '{action_id}': {fragment}")]
    SubstitutionCollision {
        index: usize,
        action_id: String,
        fragment: String,
    },
}

impl PatchError {
    /// Per-rule errors are reported and skipped; everything else aborts the patch
    pub fn is_per_rule(&self) -> bool {
        matches!(
            self,
            PatchError::MalformedRule { .. } | PatchError::SubstitutionCollision { .. }
        )
    }
}

/// Errors raised while loading inputs for a patch run
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {source} (path: {path:?})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[error("invalid TOML in {path:?}: {source}")]
    Toml {
        source: toml::de::Error,
        path: PathBuf,
    },

    #[error("critical fields missing from {path:?}: must include {field}")]
    MissingField { field: &'static str, path: PathBuf },

    #[error("unknown action '{0}' (not declared in connector metadata)")]
    UnknownAction(String),

    #[error("discovery failed: {0}")]
    Discovery(String),

    #[error("packaging failed: {0}")]
    Package(String),

    #[error(transparent)]
    Rule(#[from] PatchError),
}

impl LoadError {
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        LoadError::Io {
            source,
            path: path.into(),
        }
    }
}

impl From<walkdir::Error> for LoadError {
    fn from(e: walkdir::Error) -> Self {
        LoadError::Discovery(e.to_string())
    }
}
