// crates/abi-export/tests/scaffold.rs
// ============================================================================
// Module: Readme/License Scaffold Tests
// Description: Validate README and LICENSE generation.
// Purpose: Ensure docs are written and a missing template is tolerated.
// Dependencies: abi-export, abi-export-config, tempfile
// ============================================================================

//! ## Overview
//! Exercises [`abi_export::scaffold::write_readme_and_license`] against real
//! temporary directories.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions use panic-based checks."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use abi_export::scaffold::ScaffoldSettings;
use abi_export::scaffold::write_readme_and_license;
use abi_export_config::ExportConfig;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn readme_heading_names_the_package() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let target = temp.path().join("export");
    let settings = ScaffoldSettings {
        license_template: Some(temp.path().join("LICENSE")),
        ..ScaffoldSettings::default()
    };

    let report = write_readme_and_license("test-package", &target, &settings)?;

    let readme = fs::read_to_string(target.join("README.MD"))?;
    assert!(readme.starts_with("## test-package\n"));
    assert!(readme.contains("yarn add test-package"));
    assert!(readme.contains("`abi/`"));
    assert!(readme.contains("`contracts/`"));
    assert!(!report.license_written);
    assert!(!target.join("LICENSE").exists());
    Ok(())
}

#[test]
fn license_template_is_copied_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let template = temp.path().join("LICENSE.template");
    fs::write(&template, "MIT License\n\nCopyright (c) Example\n")?;
    let target = temp.path().join("export");
    let settings = ScaffoldSettings {
        license_template: Some(template),
        ..ScaffoldSettings::default()
    };

    let report = write_readme_and_license("@scope/pkg", &target, &settings)?;

    assert!(report.license_written);
    assert_eq!(
        fs::read_to_string(target.join("LICENSE"))?,
        "MIT License\n\nCopyright (c) Example\n"
    );
    assert!(fs::read_to_string(target.join("README.MD"))?.starts_with("## @scope/pkg\n"));
    Ok(())
}

#[test]
fn no_template_configured_skips_license() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let target = temp.path().join("export");
    let settings = ScaffoldSettings {
        license_template: None,
        readme_file: "README.md".to_string(),
        ..ScaffoldSettings::default()
    };

    let report = write_readme_and_license("pkg", &target, &settings)?;

    assert!(!report.license_written);
    let entries: Vec<String> = fs::read_dir(&target)?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(entries, vec!["README.md".to_string()]);
    Ok(())
}

#[test]
fn existing_docs_are_overwritten() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let target = temp.path().join("export");
    fs::create_dir_all(&target)?;
    fs::write(target.join("README.MD"), "stale")?;
    let settings = ScaffoldSettings {
        license_template: None,
        ..ScaffoldSettings::default()
    };

    write_readme_and_license("fresh", &target, &settings)?;

    assert!(fs::read_to_string(target.join("README.MD"))?.starts_with("## fresh\n"));
    Ok(())
}

#[test]
fn install_snippet_follows_configured_tool() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let cases = [
        (vec!["npm".to_string(), "ci".to_string()], "npm install @scope/pkg"),
        (vec!["/usr/local/bin/pnpm".to_string(), "install".to_string()], "pnpm add @scope/pkg"),
        (vec!["make".to_string(), "deps".to_string()], "npm install @scope/pkg"),
    ];
    for (index, (install, expected)) in cases.into_iter().enumerate() {
        let mut config = ExportConfig::default();
        config.commands.install = install;
        config.docs.license_template = None;
        let target = temp.path().join(format!("export-{index}"));

        write_readme_and_license("@scope/pkg", &target, &ScaffoldSettings::from_config(&config))?;

        let readme = fs::read_to_string(target.join("README.MD"))?;
        assert!(readme.contains(expected), "expected `{expected}` in {readme}");
        assert!(!readme.contains("yarn add"));
    }
    Ok(())
}
