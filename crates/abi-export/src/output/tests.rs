// crates/abi-export/src/output/tests.rs
// ============================================================================
// Module: Export Directory Unit Tests
// Description: Unit coverage for export directory reset and writes.
// Purpose: Ensure resets are complete and writes stay inside the directory.
// Dependencies: tempfile, std
// ============================================================================

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions use panic-based checks."
)]

use std::fs;
use std::path::Path;

use super::ExportDir;
use crate::ExportError;

#[test]
fn reset_removes_files_and_directories() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let export = temp.path().join("export");
    fs::create_dir_all(export.join("abi/nested"))?;
    fs::write(export.join("abi/nested/IOld.json"), "{}")?;
    fs::write(export.join("stale.txt"), "stale")?;

    let dir = ExportDir::open(&export, true)?;
    dir.reset()?;
    assert!(dir.list_files()?.is_empty());
    assert_eq!(fs::read_dir(&export)?.count(), 0);

    dir.reset()?;
    assert_eq!(fs::read_dir(&export)?.count(), 0);
    Ok(())
}

#[test]
fn open_creates_missing_directories() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let export = temp.path().join("a/b/export");
    let dir = ExportDir::open(&export, true)?;
    assert!(export.is_dir());
    assert_eq!(dir.path(), fs::canonicalize(&export)?.as_path());
    Ok(())
}

#[test]
fn open_resolves_parent_components() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    fs::create_dir_all(temp.path().join("project"))?;
    let dir = ExportDir::open(&temp.path().join("project/../pkg"), true)?;
    dir.write_file(Path::new("package.json"), b"{}")?;

    let expected = fs::canonicalize(temp.path())?.join("pkg");
    assert_eq!(dir.path(), expected.as_path());
    assert_eq!(fs::read_to_string(temp.path().join("pkg/package.json"))?, "{}");

    let nested = ExportDir::open(&temp.path().join("missing/../other/export"), true)?;
    assert_eq!(nested.path(), fs::canonicalize(temp.path())?.join("other/export").as_path());
    assert!(temp.path().join("other/export").is_dir());
    assert!(!temp.path().join("missing").exists());
    Ok(())
}

#[test]
fn open_rejects_existing_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    fs::write(temp.path().join("export"), "not a directory")?;
    let result = ExportDir::open(&temp.path().join("export"), true);
    assert!(matches!(result, Err(ExportError::OutputPath(_))));
    Ok(())
}

#[cfg(unix)]
#[test]
fn open_follows_symlinked_ancestor() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let real = temp.path().join("real");
    fs::create_dir_all(&real)?;
    std::os::unix::fs::symlink(&real, temp.path().join("link"))?;

    let dir = ExportDir::open(&temp.path().join("link/export"), true)?;
    dir.write_file(Path::new("abi/IFoo.json"), b"[]")?;

    assert_eq!(dir.path(), fs::canonicalize(&real)?.join("export").as_path());
    assert_eq!(fs::read_to_string(real.join("export/abi/IFoo.json"))?, "[]");
    Ok(())
}

#[test]
fn open_without_create_rejects_missing_directory() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let result = ExportDir::open(&temp.path().join("missing"), false);
    assert!(matches!(result, Err(ExportError::OutputPath(_))));
    Ok(())
}

#[test]
fn write_file_creates_parents_and_overwrites() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let dir = ExportDir::open(&temp.path().join("export"), true)?;
    dir.write_file(Path::new("contracts/core/IFoo.sol"), b"first")?;
    dir.write_file(Path::new("contracts/core/IFoo.sol"), b"second")?;
    assert_eq!(fs::read_to_string(temp.path().join("export/contracts/core/IFoo.sol"))?, "second");
    let files: Vec<String> = dir.list_files()?.into_iter().collect();
    assert_eq!(files, vec!["contracts/core/IFoo.sol".to_string()]);
    Ok(())
}

#[test]
fn write_file_rejects_traversal() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let dir = ExportDir::open(&temp.path().join("export"), true)?;
    for path in ["../escape.txt", "/abs.txt", ""] {
        let result = dir.write_file(Path::new(path), b"x");
        assert!(matches!(result, Err(ExportError::OutputPath(_))), "expected {path} to be rejected");
    }
    assert!(!temp.path().join("escape.txt").exists());
    Ok(())
}

#[test]
fn working_directory_and_root_are_rejected() {
    assert!(matches!(ExportDir::open(Path::new("."), true), Err(ExportError::OutputPath(_))));
    assert!(matches!(ExportDir::open(Path::new("/"), true), Err(ExportError::OutputPath(_))));
}

#[cfg(unix)]
#[test]
fn write_file_rejects_symlinked_parent() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let outside = temp.path().join("outside");
    fs::create_dir_all(&outside)?;
    let dir = ExportDir::open(&temp.path().join("export"), true)?;
    std::os::unix::fs::symlink(&outside, temp.path().join("export/abi"))?;

    let result = dir.write_file(Path::new("abi/IFoo.json"), b"{}");
    assert!(matches!(result, Err(ExportError::OutputPath(_))));
    assert!(!outside.join("IFoo.json").exists());
    Ok(())
}
