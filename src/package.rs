//! Output packaging
//!
//! Gives the dummy app its own identity, writes a patched copy of the
//! project tree next to the original and archives it as a `.tgz`.

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::LoadError;

/// Name and id for the dummy app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppIdentity {
    pub name: String,
    pub product_name: String,
    pub app_id: String,
}

impl AppIdentity {
    /// Fill unset fields from the production metadata
    ///
    /// Names default to `<production name> DEV`; the app id defaults to a
    /// fresh UUID so the dummy never shadows the production app.
    pub fn derive(
        metadata: &Value,
        name: Option<String>,
        product_name: Option<String>,
        app_id: Option<String>,
    ) -> Self {
        let dev = |field: &str| {
            let base = metadata.get(field).and_then(Value::as_str).unwrap_or("app");
            format!("{} DEV", base)
        };

        Self {
            name: name.unwrap_or_else(|| dev("name")),
            product_name: product_name.unwrap_or_else(|| dev("product_name")),
            app_id: app_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Write this identity into a metadata document
    pub fn apply(&self, metadata: &mut Value) {
        if let Some(obj) = metadata.as_object_mut() {
            obj.insert("name".to_string(), Value::String(self.name.clone()));
            obj.insert(
                "product_name".to_string(),
                Value::String(self.product_name.clone()),
            );
            obj.insert("appid".to_string(), Value::String(self.app_id.clone()));
        }
    }

    /// Directory name for the packaged app: snake-cased name plus suffix
    pub fn dir_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.name.to_lowercase().replace(' ', "_"), suffix)
    }
}

/// Serialize metadata with four-space indentation
pub fn metadata_to_string(metadata: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    metadata.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Files to overwrite in the packaged copy
#[derive(Debug, Clone)]
pub struct PackageContents<'a> {
    pub connector: (&'a Path, &'a str),
    pub metadata: (&'a Path, &'a Value),
}

/// Copy the project at `root` to `out_dir`, then write the patched connector
/// and the renamed metadata over their copies
///
/// `out_dir` may lie inside `root`; it is never copied into itself. It must
/// not be `root` or one of its ancestors.
pub fn write_package(
    root: &Path,
    out_dir: &Path,
    contents: &PackageContents<'_>,
    prune_dirs: &[String],
) -> Result<PathBuf, LoadError> {
    std::fs::create_dir_all(out_dir).map_err(|e| LoadError::io(e, out_dir))?;
    // compare canonical forms: `./out`, `out` and `lib/../out` are one directory
    let root = root.canonicalize().map_err(|e| LoadError::io(e, root))?;
    let out_dir = out_dir
        .canonicalize()
        .map_err(|e| LoadError::io(e, out_dir))?;
    if root.starts_with(&out_dir) {
        return Err(LoadError::Package(format!(
            "output directory {} contains the project {}",
            out_dir.display(),
            root.display()
        )));
    }

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || (!e.path().starts_with(&out_dir)
                    && !prune_dirs
                        .iter()
                        .any(|p| e.file_name().to_string_lossy() == p.as_str()))
        });

    for item in walker {
        let entry = item?;
        let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
        let target = out_dir.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| LoadError::io(e, &target))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).map_err(|e| LoadError::io(e, &target))?;
        }
    }

    let (connector_path, connector_text) = contents.connector;
    write_relative(&root, &out_dir, connector_path, connector_text)?;

    let (metadata_path, metadata) = contents.metadata;
    let metadata_text = metadata_to_string(metadata).map_err(|source| LoadError::Json {
        source,
        path: metadata_path.to_path_buf(),
    })?;
    write_relative(&root, &out_dir, metadata_path, &metadata_text)?;

    Ok(out_dir)
}

/// Archive `package_dir` as `<package_dir>.tgz` beside it
///
/// Entries are stored under the directory's own name.
pub fn write_archive(package_dir: &Path) -> Result<PathBuf, LoadError> {
    let name = package_dir.file_name().ok_or_else(|| {
        LoadError::Package(format!("cannot archive {}", package_dir.display()))
    })?;
    let archive_path = package_dir.with_file_name(format!("{}.tgz", name.to_string_lossy()));

    let file = File::create(&archive_path).map_err(|e| LoadError::io(e, &archive_path))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder
        .append_dir_all(name, package_dir)
        .map_err(|e| LoadError::io(e, package_dir))?;
    builder
        .into_inner()
        .and_then(|gz| gz.finish())
        .map_err(|e| LoadError::io(e, &archive_path))?;

    Ok(archive_path)
}

/// Write `text` at the position `path` has under `root`, inside `out_dir`
///
/// `root` is canonical; `path` is canonicalized before the prefix is stripped.
fn write_relative(root: &Path, out_dir: &Path, path: &Path, text: &str) -> Result<(), LoadError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    // files given from outside the project land at the package root
    let relative = match canonical.strip_prefix(root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => PathBuf::from(path.file_name().unwrap_or(path.as_os_str())),
    };
    let target = out_dir.join(relative);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LoadError::io(e, parent))?;
    }
    std::fs::write(&target, text).map_err(|e| LoadError::io(e, &target))
}
