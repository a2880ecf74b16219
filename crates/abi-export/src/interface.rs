// crates/abi-export/src/interface.rs
// ============================================================================
// Module: Interface Discovery
// Description: Enumerates interface sources under the interfaces root.
// Purpose: Produce the full, ordered set of interfaces before processing.
// Dependencies: cap-std
// ============================================================================

//! ## Overview
//! Discovery walks the interfaces root recursively and collects every file
//! with the configured extension. Results are sorted by relative path, so
//! repeated runs copy interfaces in the same order.
//!
//! Hidden entries (names starting with `.`) are skipped. A symlinked source
//! file is included like a regular one; symlinked directories are not
//! descended into. Two interfaces sharing a name are rejected because their
//! ABI files would collide in the export directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use crate::ExportError;

/// A discovered interface source.
///
/// # Invariants
/// - `relative_path` is relative to the interfaces root and contains only normal components.
/// - `interface_name` is the file name of `relative_path` without its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceArtifact {
    /// Interface name (file stem).
    interface_name: String,
    /// Path relative to the interfaces root.
    relative_path: PathBuf,
    /// Path of the source file as seen from the working directory.
    source_path: PathBuf,
}

impl InterfaceArtifact {
    /// Builds an interface from the interfaces root and a relative source path.
    ///
    /// # Errors
    /// Returns [`ExportError::Discovery`] when the path has no usable file name.
    pub fn new(root: &Path, relative_path: PathBuf) -> Result<Self, ExportError> {
        let interface_name = relative_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ExportError::Discovery(format!(
                    "interface path has no usable name: {}",
                    relative_path.display()
                ))
            })?;
        Ok(Self {
            interface_name,
            source_path: root.join(&relative_path),
            relative_path,
        })
    }

    /// Returns the interface name.
    #[must_use]
    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    /// Returns the path relative to the interfaces root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Returns the source file path.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Reads the interface source text.
    ///
    /// # Errors
    /// Returns [`ExportError::FileSystem`] when the file cannot be read as UTF-8.
    pub fn read_source(&self) -> Result<String, ExportError> {
        fs::read_to_string(&self.source_path).map_err(|err| {
            ExportError::FileSystem(format!("unable to read {}: {err}", self.source_path.display()))
        })
    }

    /// Returns the expected compiled artifact location, `<out>/<file name>/<name>.json`.
    #[must_use]
    pub fn compiled_artifact_path(&self, build_out_dir: &Path) -> PathBuf {
        let mut path = build_out_dir.to_path_buf();
        if let Some(file_name) = self.relative_path.file_name() {
            path.push(file_name);
        }
        path.push(format!("{}.json", self.interface_name));
        path
    }
}

/// Discovers all interface sources with `extension` under `root`.
///
/// An empty result is valid.
///
/// # Errors
/// Returns [`ExportError::Discovery`] when the root is missing or unreadable,
/// when a symlink cannot be resolved, or when two interfaces share a name.
pub fn discover_interfaces(
    root: &Path,
    extension: &str,
) -> Result<Vec<InterfaceArtifact>, ExportError> {
    let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(|err| {
        ExportError::Discovery(format!("unable to open {}: {err}", root.display()))
    })?;
    let mut found = BTreeMap::new();
    collect_sources(root, &dir, Path::new(""), extension, &mut found)?;

    let mut names: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut interfaces = Vec::with_capacity(found.len());
    for relative in found.into_values() {
        let interface = InterfaceArtifact::new(root, relative)?;
        if let Some(existing) = names.insert(
            interface.interface_name().to_string(),
            interface.relative_path().to_path_buf(),
        ) {
            return Err(ExportError::Discovery(format!(
                "duplicate interface name {}: {} and {}",
                interface.interface_name(),
                existing.display(),
                interface.relative_path().display()
            )));
        }
        interfaces.push(interface);
    }
    Ok(interfaces)
}

/// Recursively collects matching files keyed by their `/`-joined relative path.
fn collect_sources(
    root: &Path,
    current: &Dir,
    prefix: &Path,
    extension: &str,
    found: &mut BTreeMap<String, PathBuf>,
) -> Result<(), ExportError> {
    let entries = current.entries().map_err(|err| discovery_error(prefix, &err))?;
    for entry in entries {
        let entry = entry.map_err(|err| discovery_error(prefix, &err))?;
        let file_name = entry.file_name();
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }
        let relative = if prefix.as_os_str().is_empty() {
            PathBuf::from(&file_name)
        } else {
            prefix.join(&file_name)
        };
        let file_type = entry.file_type().map_err(|err| discovery_error(&relative, &err))?;
        let is_source = relative.extension().is_some_and(|value| value == extension);
        if file_type.is_symlink() {
            let target = fs::metadata(root.join(&relative))
                .map_err(|err| discovery_error(&relative, &err))?;
            if target.is_file() && is_source {
                insert_source(found, relative);
            } else if target.is_dir() {
                debug!(path = %relative.display(), "skipping symlinked directory");
            }
        } else if file_type.is_dir() {
            let directory = entry.open_dir().map_err(|err| discovery_error(&relative, &err))?;
            collect_sources(root, &directory, &relative, extension, found)?;
        } else if file_type.is_file() && is_source {
            insert_source(found, relative);
        }
    }
    Ok(())
}

/// Records a source keyed by its `/`-joined relative path.
fn insert_source(found: &mut BTreeMap<String, PathBuf>, relative: PathBuf) {
    let key = relative.to_string_lossy().replace('\\', "/");
    found.insert(key, relative);
}

/// Maps a traversal failure to a discovery error naming the relative path.
fn discovery_error(path: &Path, err: &std::io::Error) -> ExportError {
    ExportError::Discovery(format!("unable to read {}: {err}", path.display()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
