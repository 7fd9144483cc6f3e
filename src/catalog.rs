//! Action catalog parsed from connector metadata
//!
//! Only used to validate rules before they reach the patch engine.

use serde_json::Value;

use crate::error::{LoadError, PatchError};

/// One declared action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub identifier: String,
    pub parameters: Vec<String>,
}

/// Actions declared by a connector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionCatalog {
    actions: Vec<ActionSpec>,
}

impl ActionCatalog {
    /// Build from the metadata document's `actions` array
    ///
    /// Entries without an `identifier` are ignored.
    pub fn from_metadata(metadata: &Value) -> Self {
        let actions = metadata
            .get("actions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|action| {
                        let identifier = action.get("identifier")?.as_str()?.to_string();
                        let parameters = action
                            .get("parameters")
                            .and_then(Value::as_object)
                            .map(|params| params.keys().cloned().collect())
                            .unwrap_or_default();
                        Some(ActionSpec {
                            identifier,
                            parameters,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { actions }
    }

    pub fn get(&self, identifier: &str) -> Option<&ActionSpec> {
        self.actions.iter().find(|a| a.identifier == identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.identifier.as_str())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Check that the action is declared and, if given, that the guard
    /// parameter belongs to it
    pub fn validate(
        &self,
        index: usize,
        action_id: &str,
        parameter: Option<&str>,
    ) -> Result<(), LoadError> {
        let action = self
            .get(action_id)
            .ok_or_else(|| LoadError::UnknownAction(action_id.to_string()))?;

        if let Some(parameter) = parameter {
            if !action.parameters.iter().any(|p| p == parameter) {
                return Err(PatchError::MalformedRule {
                    index,
                    action_id: action_id.to_string(),
                    reason: format!("action declares no parameter '{}'", parameter),
                }
                .into());
            }
        }

        Ok(())
    }
}
