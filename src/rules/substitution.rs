//! Literal substitution table for dummy-data documents
//!
//! A flat JSON object of `"find": "replace"` pairs. Each pair is applied as a
//! plain, case-sensitive substring replacement to the raw text of a data
//! document before it is parsed. It never touches connector text.

use serde_json::Value;
use std::path::Path;

use crate::error::LoadError;

/// Loaded substitution table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTable {
    entries: Vec<(String, String)>,
}

impl SubstitutionTable {
    /// Create an empty table
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a table from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::io(e, path))?;
        Self::from_json(&content).map_err(|source| LoadError::Json {
            source,
            path: path.to_path_buf(),
        })
    }

    /// Parse from a JSON string
    ///
    /// Non-string values are inserted using their JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let map: serde_json::Map<String, Value> = serde_json::from_str(json)?;
        let entries = map
            .into_iter()
            .map(|(key, value)| {
                let replacement = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, replacement)
            })
            .collect();
        Ok(Self { entries })
    }

    /// Build from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Apply every substitution to the given text
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();

        for (find, replace) in &self.entries {
            if find.is_empty() {
                continue;
            }
            result = result.replace(find.as_str(), replace);
        }

        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
