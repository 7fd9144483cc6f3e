//! Connector project discovery
//!
//! Walks a project directory looking for the connector module, its metadata
//! document and an optional substitution table.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use crate::error::LoadError;

/// Files making up a connector project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFiles {
    pub root: PathBuf,
    pub connector: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub substitutions: Option<PathBuf>,
}

impl ProjectFiles {
    /// Project rooted at `root` with nothing found yet
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn connector_path(&self) -> Result<&Path, LoadError> {
        self.connector.as_deref().ok_or_else(|| {
            LoadError::Discovery(format!(
                "no connector file found under {}",
                self.root.display()
            ))
        })
    }

    pub fn metadata_path(&self) -> Result<&Path, LoadError> {
        self.metadata.as_deref().ok_or_else(|| {
            LoadError::Discovery(format!(
                "no metadata file found under {}",
                self.root.display()
            ))
        })
    }
}

/// Keep the shallowest match; ties go to the first visited
fn keep_shallowest(slot: &mut Option<(usize, PathBuf)>, depth: usize, path: &Path) {
    if slot.as_ref().map_or(true, |(found, _)| depth < *found) {
        *slot = Some((depth, path.to_path_buf()));
    }
}

/// Scan `root` for project files
///
/// Entries are visited in file-name order. For each kind the match closest
/// to `root` wins, so dummy-data documents in subdirectories never shadow
/// the metadata document.
pub fn discover(root: &Path, config: &DiscoveryConfig) -> Result<ProjectFiles, LoadError> {
    let mut connector = None;
    let mut metadata = None;
    let mut substitutions = None;

    let connector_suffix = config.connector_suffix.to_lowercase();
    let marker = config.substitution_marker.to_lowercase();
    let metadata_ext = config.metadata_extension.to_lowercase();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !config
                    .prune_dirs
                    .iter()
                    .any(|p| e.file_name().to_string_lossy() == p.as_str())
        });

    for item in walker {
        let entry = item?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        let (depth, path) = (entry.depth(), entry.path());

        if name.ends_with(&connector_suffix) {
            keep_shallowest(&mut connector, depth, path);
        } else if !marker.is_empty() && name.contains(&marker) {
            keep_shallowest(&mut substitutions, depth, path);
        } else if name.ends_with(&metadata_ext) {
            keep_shallowest(&mut metadata, depth, path);
        }
    }

    Ok(ProjectFiles {
        root: root.to_path_buf(),
        connector: connector.map(|(_, p)| p),
        metadata: metadata.map(|(_, p)| p),
        substitutions: substitutions.map(|(_, p)| p),
    })
}
