// crates/abi-export/src/output.rs
// ============================================================================
// Module: Export Directory
// Description: Capability-scoped writer for the export directory.
// Purpose: Reset the staging directory and write package files safely.
// Dependencies: cap-primitives, cap-std
// ============================================================================

//! ## Overview
//! [`ExportDir`] holds a directory capability for the export directory. All
//! writes go through it using relative paths: parent directories are created
//! without following symlinks, and files are written to a temporary sibling
//! and renamed into place.
//!
//! The export directory path itself may contain `..` or pass through
//! symlinked ancestors; it is resolved once when opened. It must not be the
//! working directory or one of its ancestors, since a reset removes everything
//! inside it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use cap_primitives::fs::FollowSymlinks;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::OpenOptions;

use crate::ExportError;

// ============================================================================
// SECTION: Export Directory
// ============================================================================

/// Handle to the export directory.
///
/// # Invariants
/// - `path` is absolute and free of `.`, `..` and symlinks.
/// - `dir` refers to the directory at `path`.
#[derive(Debug)]
pub struct ExportDir {
    /// Absolute export directory path.
    path: PathBuf,
    /// Directory capability for the export directory.
    dir: Dir,
}

impl ExportDir {
    /// Opens the export directory, creating missing components when requested.
    ///
    /// The existing part of the path is resolved first (so `..` and symlinked
    /// ancestors behave as the OS resolves them); components created below it
    /// are opened without following symlinks.
    ///
    /// # Errors
    /// Returns [`ExportError::OutputPath`] when the path is empty, names a
    /// non-directory, or is the working directory (or an ancestor).
    pub fn open(path: &Path, create_missing: bool) -> Result<Self, ExportError> {
        if path.as_os_str().is_empty() {
            return Err(ExportError::OutputPath(path.to_path_buf()));
        }
        let resolved = resolve_export_path(&normalize_output_dir(path)?)?;
        ensure_outside_working_dir(&resolved)?;
        let anchor = resolved
            .ancestors()
            .find(|ancestor| ancestor.is_dir())
            .ok_or_else(|| ExportError::OutputPath(path.to_path_buf()))?;
        let missing: Vec<OsString> = resolved
            .strip_prefix(anchor)
            .map_err(|_| ExportError::OutputPath(path.to_path_buf()))?
            .components()
            .map(|component| component.as_os_str().to_os_string())
            .collect();
        let mut current = Dir::open_ambient_dir(anchor, ambient_authority())
            .map_err(|err| map_open_error(&err, path))?;
        for component in missing {
            current = open_or_create_child_dir_nofollow(
                &current,
                Path::new(component.as_os_str()),
                create_missing,
            )
            .map_err(|err| map_open_error(&err, path))?;
        }
        Ok(Self {
            path: resolved,
            dir: current,
        })
    }

    /// Returns the absolute export directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes every entry inside the export directory.
    ///
    /// # Errors
    /// Returns [`ExportError::FileSystem`] when an entry cannot be removed.
    pub fn reset(&self) -> Result<(), ExportError> {
        let entries = self.dir.entries().map_err(|err| ExportError::FileSystem(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| ExportError::FileSystem(err.to_string()))?;
            let name = entry.file_name();
            let file_type = entry.file_type().map_err(|err| ExportError::FileSystem(err.to_string()))?;
            let removed = if file_type.is_dir() {
                self.dir.remove_dir_all(&name)
            } else {
                self.dir.remove_file(&name)
            };
            removed.map_err(|err| {
                ExportError::FileSystem(format!(
                    "unable to remove {}: {err}",
                    Path::new(&name).display()
                ))
            })?;
        }
        Ok(())
    }

    /// Writes bytes to a relative path, creating parent directories.
    ///
    /// # Errors
    /// Returns [`ExportError`] when the path is unsafe or the write fails.
    pub fn write_file(&self, relative: &Path, bytes: &[u8]) -> Result<(), ExportError> {
        let relative = validate_relative_path(relative)?;
        let (parent_dir, file_name, file_path) = open_parent_dir(&self.dir, &relative, true)?;
        write_file_atomic(&parent_dir, Path::new(file_name.as_os_str()), &file_path, bytes)
    }

    /// Lists every file in the export directory as `/`-separated relative paths.
    ///
    /// # Errors
    /// Returns [`ExportError`] when traversal fails or a symlink is found.
    pub fn list_files(&self) -> Result<BTreeSet<String>, ExportError> {
        let mut files = BTreeSet::new();
        collect_files_recursive(&self.dir, Path::new(""), &mut files)?;
        Ok(files)
    }
}

// ============================================================================
// SECTION: Path Helpers
// ============================================================================

/// Normalizes an output directory into an absolute path.
fn normalize_output_dir(output_dir: &Path) -> Result<PathBuf, ExportError> {
    if output_dir.is_absolute() {
        return Ok(output_dir.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(output_dir))
        .map_err(|err| ExportError::FileSystem(err.to_string()))
}

/// Rejects export directories that would contain the working directory.
fn ensure_outside_working_dir(resolved: &Path) -> Result<(), ExportError> {
    let cwd = std::env::current_dir()
        .and_then(std::fs::canonicalize)
        .map_err(|err| ExportError::FileSystem(err.to_string()))?;
    if cwd.starts_with(resolved) {
        return Err(ExportError::OutputPath(resolved.to_path_buf()));
    }
    Ok(())
}

/// Resolves an absolute path: the longest existing prefix is canonicalized and
/// the remaining (missing) components are folded lexically.
fn resolve_export_path(absolute: &Path) -> Result<PathBuf, ExportError> {
    let mut existing = PathBuf::new();
    let mut tail = Vec::new();
    for component in absolute.components() {
        if tail.is_empty() {
            let candidate = existing.join(component.as_os_str());
            if candidate.exists() {
                existing = candidate;
                continue;
            }
        }
        tail.push(component);
    }
    let mut resolved = std::fs::canonicalize(&existing)
        .map_err(|_| ExportError::OutputPath(absolute.to_path_buf()))?;
    for component in tail {
        match component {
            Component::Normal(value) => resolved.push(value),
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            Component::Prefix(_) | Component::RootDir => {
                return Err(ExportError::OutputPath(absolute.to_path_buf()));
            }
        }
    }
    Ok(resolved)
}

/// Validates that a file path is relative and free of traversal.
fn validate_relative_path(path: &Path) -> Result<PathBuf, ExportError> {
    if path.as_os_str().is_empty() || path.is_absolute() {
        return Err(ExportError::OutputPath(path.to_path_buf()));
    }
    for component in path.components() {
        if !matches!(component, Component::Normal(_) | Component::CurDir) {
            return Err(ExportError::OutputPath(path.to_path_buf()));
        }
    }
    Ok(path.components().filter(|component| matches!(component, Component::Normal(_))).collect())
}

// ============================================================================
// SECTION: Directory Helpers
// ============================================================================

/// Opens a child directory without following symlinks.
fn open_child_dir_nofollow(parent: &Dir, child: &Path) -> std::io::Result<Dir> {
    let mut options = OpenOptions::new();
    options.read(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    let file = parent.open_with(child, &options)?;
    let metadata = file.metadata()?;
    if !metadata.is_dir() {
        return Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            "path component is not a directory",
        ));
    }
    Ok(Dir::from_std_file(file.into_std()))
}

/// Opens or creates a child directory without following symlinks.
fn open_or_create_child_dir_nofollow(
    parent: &Dir,
    child: &Path,
    create_missing: bool,
) -> std::io::Result<Dir> {
    match open_child_dir_nofollow(parent, child) {
        Ok(dir) => Ok(dir),
        Err(err) if err.kind() == ErrorKind::NotFound && create_missing => {
            parent.create_dir(child)?;
            open_child_dir_nofollow(parent, child)
        }
        Err(err) => Err(err),
    }
}

/// Maps low-level open errors into path errors where the path is at fault.
fn map_open_error(err: &std::io::Error, path: &Path) -> ExportError {
    if matches!(
        err.kind(),
        ErrorKind::NotFound
            | ErrorKind::InvalidInput
            | ErrorKind::PermissionDenied
            | ErrorKind::NotADirectory
            | ErrorKind::Unsupported
    ) {
        return ExportError::OutputPath(path.to_path_buf());
    }
    // ELOOP: a symlink was refused.
    #[cfg(unix)]
    if err.raw_os_error() == Some(40) {
        return ExportError::OutputPath(path.to_path_buf());
    }
    ExportError::FileSystem(err.to_string())
}

/// Opens the parent directory for a relative file path.
fn open_parent_dir(
    root: &Dir,
    relative: &Path,
    create_missing: bool,
) -> Result<(Dir, OsString, PathBuf), ExportError> {
    let mut current = root.try_clone().map_err(|err| ExportError::FileSystem(err.to_string()))?;
    let mut parent = PathBuf::new();
    let mut components = relative.components().peekable();
    while let Some(component) = components.next() {
        let Component::Normal(name) = component else {
            return Err(ExportError::OutputPath(relative.to_path_buf()));
        };
        if components.peek().is_none() {
            let file_name = name.to_os_string();
            let file_path = if parent.as_os_str().is_empty() {
                PathBuf::from(&file_name)
            } else {
                parent.join(&file_name)
            };
            return Ok((current, file_name, file_path));
        }
        parent.push(name);
        current = open_or_create_child_dir_nofollow(&current, Path::new(name), create_missing)
            .map_err(|err| map_open_error(&err, relative))?;
    }
    Err(ExportError::OutputPath(relative.to_path_buf()))
}

/// Writes file bytes using a temporary sibling and atomic rename.
fn write_file_atomic(
    parent: &Dir,
    file_name: &Path,
    file_path: &Path,
    bytes: &[u8],
) -> Result<(), ExportError> {
    for attempt in 0 .. 64_u32 {
        let temp_name = temp_file_name(file_name, attempt)?;
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        options._cap_fs_ext_follow(FollowSymlinks::No);
        match parent.open_with(&temp_name, &options) {
            Ok(mut temp_file) => {
                if let Err(err) = temp_file.write_all(bytes) {
                    let _ = parent.remove_file(&temp_name);
                    return Err(ExportError::FileSystem(err.to_string()));
                }
                if let Err(err) = temp_file.sync_all() {
                    let _ = parent.remove_file(&temp_name);
                    return Err(ExportError::FileSystem(err.to_string()));
                }
                if let Err(err) = parent.rename(&temp_name, parent, file_name) {
                    let _ = parent.remove_file(&temp_name);
                    return Err(ExportError::FileSystem(err.to_string()));
                }
                return Ok(());
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(map_open_error(&err, file_path)),
        }
    }
    Err(ExportError::FileSystem("unable to allocate temporary output file".to_string()))
}

/// Builds a temporary file name for atomic writes.
fn temp_file_name(file_name: &Path, attempt: u32) -> Result<PathBuf, ExportError> {
    let Some(base_name) = file_name.file_name() else {
        return Err(ExportError::OutputPath(file_name.to_path_buf()));
    };
    let mut temp = OsString::from(".tmp-");
    temp.push(base_name);
    temp.push(format!(".{}.{}", std::process::id(), attempt));
    Ok(PathBuf::from(temp))
}

/// Recursively collects file paths relative to the root directory.
fn collect_files_recursive(
    current: &Dir,
    prefix: &Path,
    files: &mut BTreeSet<String>,
) -> Result<(), ExportError> {
    let entries = current.entries().map_err(|err| ExportError::FileSystem(err.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|err| ExportError::FileSystem(err.to_string()))?;
        let file_name = entry.file_name();
        let relative = if prefix.as_os_str().is_empty() {
            PathBuf::from(&file_name)
        } else {
            prefix.join(&file_name)
        };
        let file_type = entry.file_type().map_err(|err| ExportError::FileSystem(err.to_string()))?;
        if file_type.is_symlink() {
            return Err(ExportError::OutputPath(relative));
        }
        if file_type.is_dir() {
            let directory =
                entry.open_dir().map_err(|err| ExportError::FileSystem(err.to_string()))?;
            collect_files_recursive(&directory, &relative, files)?;
        } else if file_type.is_file() {
            let text =
                relative.to_str().ok_or_else(|| ExportError::OutputPath(relative.clone()))?;
            files.insert(text.replace('\\', "/"));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
