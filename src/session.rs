//! Patch session
//!
//! Carries everything gathered for one run: project files, connector text,
//! metadata, action catalog, substitution table and the accepted rules.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::catalog::ActionCatalog;
use crate::discovery::ProjectFiles;
use crate::error::LoadError;
use crate::input::{DummyPayload, DummyRule, RuleFile, RuleSpec};
use crate::rules::substitution::SubstitutionTable;

/// A rule that could not be loaded
#[derive(Debug)]
pub struct RuleFailure {
    pub index: usize,
    pub data_file: PathBuf,
    pub error: LoadError,
}

/// State for one patch run
#[derive(Debug)]
pub struct Session {
    files: ProjectFiles,
    connector_source: String,
    metadata: Value,
    catalog: ActionCatalog,
    substitutions: Option<SubstitutionTable>,
    rules: Vec<DummyRule>,
    failures: Vec<RuleFailure>,
}

impl Session {
    /// Read the connector, metadata and substitution table for a project
    pub fn open(files: ProjectFiles) -> Result<Self, LoadError> {
        let connector_path = files.connector_path()?;
        let connector_source = std::fs::read_to_string(connector_path)
            .map_err(|e| LoadError::io(e, connector_path))?;

        let metadata_path = files.metadata_path()?;
        let metadata_text = std::fs::read_to_string(metadata_path)
            .map_err(|e| LoadError::io(e, metadata_path))?;
        let metadata: Value =
            serde_json::from_str(&metadata_text).map_err(|source| LoadError::Json {
                source,
                path: metadata_path.to_path_buf(),
            })?;

        let substitutions = files
            .substitutions
            .as_deref()
            .map(SubstitutionTable::from_file)
            .transpose()?;

        Ok(Self::from_parts(
            files,
            connector_source,
            metadata,
            substitutions,
        ))
    }

    /// Build a session from already loaded inputs
    pub fn from_parts(
        files: ProjectFiles,
        connector_source: String,
        metadata: Value,
        substitutions: Option<SubstitutionTable>,
    ) -> Self {
        let catalog = ActionCatalog::from_metadata(&metadata);
        Self {
            files,
            connector_source,
            metadata,
            catalog,
            substitutions,
            rules: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Validate and accept a rule
    pub fn add_rule(&mut self, rule: DummyRule) -> Result<(), LoadError> {
        let index = self.rules.len() + self.failures.len();
        self.catalog
            .validate(index, &rule.action_id, rule.guard_parameter.as_deref())?;
        rule.guard(index)?;
        self.rules.push(rule);
        Ok(())
    }

    /// Load the data document named by `spec` and add the resulting rule
    ///
    /// Relative data paths resolve against `base_dir`.
    pub fn add_rule_spec(&mut self, spec: RuleSpec, base_dir: &Path) -> Result<(), LoadError> {
        let data_path = base_dir.join(&spec.data_file);
        let payload = DummyPayload::from_file(&data_path, self.substitutions.as_ref())?;
        self.add_rule(spec.into_rule(payload))
    }

    /// Load every rule of a batch file
    ///
    /// A rule that fails is recorded and skipped; the rest still load.
    /// Returns the number of rules accepted.
    pub fn load_rule_file(&mut self, path: &Path) -> Result<usize, LoadError> {
        let file = RuleFile::from_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut accepted = 0;

        for spec in file.rules {
            let index = self.rules.len() + self.failures.len();
            let data_file = base_dir.join(&spec.data_file);
            match self.add_rule_spec(spec, base_dir) {
                Ok(()) => accepted += 1,
                Err(error) => self.failures.push(RuleFailure {
                    index,
                    data_file,
                    error,
                }),
            }
        }

        Ok(accepted)
    }

    pub fn files(&self) -> &ProjectFiles {
        &self.files
    }

    pub fn connector_source(&self) -> &str {
        &self.connector_source
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Value {
        &mut self.metadata
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn substitutions(&self) -> Option<&SubstitutionTable> {
        self.substitutions.as_ref()
    }

    pub fn rules(&self) -> &[DummyRule] {
        &self.rules
    }

    pub fn failures(&self) -> &[RuleFailure] {
        &self.failures
    }
}
