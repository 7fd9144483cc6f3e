//! Rule and dummy-data input
//!
//! A rule batch file (TOML) names, per action, the dummy-data document to
//! serve and the optional parameter guard. Data documents are JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{LoadError, PatchError, Result};
use crate::rules::substitution::SubstitutionTable;

/// Canned response served for one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyPayload {
    /// Summary object attached to the action result
    pub summary: Value,

    /// Status message returned with success
    #[serde(default)]
    pub message: String,

    /// Data items attached in order
    #[serde(default)]
    pub data: Vec<Value>,
}

impl DummyPayload {
    pub fn new(summary: Value, message: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            summary,
            message: message.into(),
            data,
        }
    }

    /// Parse a dummy-data document
    ///
    /// The document is either an object or an array whose first element is
    /// the object. `summary` and `data` are required, `message` defaults to
    /// the empty string.
    pub fn from_document(text: &str, path: &Path) -> std::result::Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text).map_err(|source| LoadError::Json {
            source,
            path: path.to_path_buf(),
        })?;

        let doc = match value {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };

        let Value::Object(mut obj) = doc else {
            return Err(LoadError::MissingField {
                field: "\"summary\" and \"data\"",
                path: path.to_path_buf(),
            });
        };

        let summary = obj.remove("summary").ok_or_else(|| LoadError::MissingField {
            field: "\"summary\"",
            path: path.to_path_buf(),
        })?;

        let data = match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(LoadError::MissingField {
                    field: "\"data\" (array)",
                    path: path.to_path_buf(),
                })
            }
        };

        let message = match obj.remove("message") {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(Self {
            summary,
            message,
            data,
        })
    }

    /// Read a document from disk, applying the substitution table first
    pub fn from_file(
        path: &Path,
        substitutions: Option<&SubstitutionTable>,
    ) -> std::result::Result<Self, LoadError> {
        let raw = std::fs::read_to_string(path).map_err(|e| LoadError::io(e, path))?;
        let text = match substitutions {
            Some(table) => table.apply(&raw),
            None => raw,
        };
        Self::from_document(&text, path)
    }
}

/// Parameter equality check gating a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guard<'a> {
    pub parameter: &'a str,
    pub value: &'a str,
}

/// A per-action canned-response rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyRule {
    pub action_id: String,
    pub use_for_all: bool,
    #[serde(default)]
    pub guard_parameter: Option<String>,
    #[serde(default)]
    pub guard_value: Option<String>,
    pub payload: DummyPayload,
}

impl DummyRule {
    /// Rule served for every call of the action
    pub fn for_all(action_id: impl Into<String>, payload: DummyPayload) -> Self {
        Self {
            action_id: action_id.into(),
            use_for_all: true,
            guard_parameter: None,
            guard_value: None,
            payload,
        }
    }

    /// Rule served only when `parameter == value`
    pub fn guarded(
        action_id: impl Into<String>,
        parameter: impl Into<String>,
        value: impl Into<String>,
        payload: DummyPayload,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            use_for_all: false,
            guard_parameter: Some(parameter.into()),
            guard_value: Some(value.into()),
            payload,
        }
    }

    /// Validate the guard fields and return the guard, if any
    ///
    /// The guard is present exactly when `use_for_all` is false.
    pub fn guard(&self, index: usize) -> Result<Option<Guard<'_>>> {
        let malformed = |reason: &str| PatchError::MalformedRule {
            index,
            action_id: self.action_id.clone(),
            reason: reason.to_string(),
        };

        if self.action_id.trim().is_empty() {
            return Err(malformed("action identifier is empty"));
        }

        match (
            self.use_for_all,
            self.guard_parameter.as_deref(),
            self.guard_value.as_deref(),
        ) {
            (true, None, None) => Ok(None),
            (true, _, _) => Err(malformed(
                "guard fields must be absent when the rule applies to all requests",
            )),
            (false, Some(parameter), Some(value)) => {
                if parameter.is_empty() {
                    Err(malformed("guard parameter is empty"))
                } else if value.is_empty() {
                    Err(malformed("parameter value must be provided"))
                } else {
                    Ok(Some(Guard { parameter, value }))
                }
            }
            (false, _, _) => Err(malformed(
                "guard parameter and value are both required unless the rule applies to all requests",
            )),
        }
    }
}

/// One `[[rule]]` entry of a batch file
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    /// Action identifier (from the connector metadata)
    pub action: String,

    /// Dummy-data document, relative to the batch file
    pub data_file: PathBuf,

    /// Serve for every request; defaults to true when no parameter is given
    #[serde(default)]
    pub use_for_all: Option<bool>,

    #[serde(default)]
    pub parameter: Option<String>,

    #[serde(default)]
    pub value: Option<String>,
}

impl RuleSpec {
    pub fn use_for_all(&self) -> bool {
        self.use_for_all.unwrap_or(self.parameter.is_none())
    }

    /// Build a rule from this spec and an already loaded payload
    pub fn into_rule(self, payload: DummyPayload) -> DummyRule {
        let use_for_all = self.use_for_all();
        DummyRule {
            action_id: self.action,
            use_for_all,
            guard_parameter: self.parameter,
            guard_value: self.value,
            payload,
        }
    }
}

/// Rule batch file structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleFile {
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleSpec>,
}

impl RuleFile {
    /// Load a batch file
    pub fn from_file(path: &Path) -> std::result::Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::io(e, path))?;
        toml::from_str(&content).map_err(|source| LoadError::Toml {
            source,
            path: path.to_path_buf(),
        })
    }
}
