//! Configuration loading for dabcat
//!
//! Supports TOML configuration with embedded defaults.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::LoadError;

/// General configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable audit logging
    pub audit_log: bool,

    /// Path to audit log file
    pub audit_path: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            audit_log: true,
            audit_path: Some("~/.dabcat/audit.jsonl".to_string()),
        }
    }
}

/// Patch synthesis configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Keyword sequence that opens the handler entry line
    pub anchor_entry: String,

    /// Fail when more than one anchor line matches (otherwise first wins)
    pub strict_anchor: bool,

    /// Reject rules whose payload would be mangled by the token rewriter
    pub detect_collisions: bool,

    /// Name of the call-parameter binding in the connector
    pub param_binding: String,

    /// Name of the local binding that holds the dispatched action
    pub action_binding: String,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            anchor_entry: "def handle_action".to_string(),
            strict_anchor: false,
            detect_collisions: false,
            param_binding: "param".to_string(),
            action_binding: "action".to_string(),
        }
    }
}

/// Project discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// File name suffix identifying the connector module
    pub connector_suffix: String,

    /// Substring identifying the substitution table file
    pub substitution_marker: String,

    /// Extension of the metadata document
    pub metadata_extension: String,

    /// Directories skipped while walking the project
    pub prune_dirs: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            connector_suffix: "_connector.py".to_string(),
            substitution_marker: "replacerizer".to_string(),
            metadata_extension: ".json".to_string(),
            prune_dirs: vec![
                ".git".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
                "node_modules".to_string(),
            ],
        }
    }
}

/// Output packaging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Suffix appended to the snake-cased app name for the output directory
    pub output_suffix: String,

    /// Write a gzipped tarball of the output directory next to it
    pub archive: bool,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            output_suffix: "dummy".to_string(),
            archive: true,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub patch: PatchConfig,
    pub discovery: DiscoveryConfig,
    pub package: PackageConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load() -> Self {
        let config_paths = [
            // User-specific config
            dirs::config_dir().map(|p| p.join("dabcat/config.toml")),
            // System-wide config
            Some(PathBuf::from("/etc/dabcat/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if path.exists() {
                if let Ok(content) = std::fs::read_to_string(&path) {
                    match toml::from_str(&content) {
                        Ok(config) => return config,
                        Err(e) => {
                            eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                        }
                    }
                }
            }
        }

        Config::default()
    }

    /// Load from a specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::io(e, path))?;
        toml::from_str(&content).map_err(|source| LoadError::Toml {
            source,
            path: path.to_path_buf(),
        })
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get the audit log path (expanded)
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.general.audit_path.as_ref().map(|p| Self::expand_path(p))
    }

    /// Turn on every strictness option
    pub fn strict(mut self) -> Self {
        self.patch.strict_anchor = true;
        self.patch.detect_collisions = true;
        self
    }
}

/// Embedded default configuration
pub const DEFAULT_CONFIG_TOML: &str = r#"
[general]
audit_log = true
audit_path = "~/.dabcat/audit.jsonl"

[patch]
anchor_entry = "def handle_action"
strict_anchor = false
detect_collisions = false
param_binding = "param"
action_binding = "action"

[discovery]
connector_suffix = "_connector.py"
substitution_marker = "replacerizer"
metadata_extension = ".json"
prune_dirs = [".git", "__pycache__", ".venv", "node_modules"]

[package]
output_suffix = "dummy"
archive = true
"#;
