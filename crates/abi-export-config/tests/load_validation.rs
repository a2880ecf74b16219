//! Config load validation tests for abi-export-config.
// crates/abi-export-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, fields).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

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

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use abi_export_config::ConfigError;
use abi_export_config::ExportConfig;
use abi_export_config::PublishMode;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<ExportConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn parse(toml: &str) -> Result<ExportConfig, ConfigError> {
    ExportConfig::from_bytes(toml.as_bytes())
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(ExportConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        ExportConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let temp = tempfile::tempdir().map_err(|err| err.to_string())?;
    let missing = temp.path().join("abi-export.toml");
    assert_invalid(ExportConfig::load(Some(&missing)), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'#'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(ExportConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_large_sparse_file_by_metadata() -> TestResult {
    let file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.as_file().set_len(4 * 1024 * 1024 * 1024).map_err(|err| err.to_string())?;
    assert_invalid(ExportConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(ExportConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_reads_explicit_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"[publish]\nmode = \"web3-v1\"\n").map_err(|err| err.to_string())?;
    let config = ExportConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.publish.mode != PublishMode::Web3V1 {
        return Err(format!("unexpected mode {}", config.publish.mode));
    }
    Ok(())
}

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let config = parse("").map_err(|err| err.to_string())?;
    if config != ExportConfig::default() {
        return Err("empty config should match defaults".to_string());
    }
    if config.interfaces.root != PathBuf::from("solidity/interfaces") {
        return Err("unexpected default interfaces root".to_string());
    }
    if config.commands.publish != ["yarn", "publish", "--access", "public"] {
        return Err("unexpected default publish command".to_string());
    }
    if config.remappings.len() != 1 || config.remappings[0].prefix != "interfaces/" {
        return Err("unexpected default remappings".to_string());
    }
    Ok(())
}

#[test]
fn unknown_fields_are_rejected() -> TestResult {
    assert_invalid(parse("[layout]\nbogus = \"x\"\n"), "config parse error")
}

#[test]
fn unknown_publish_mode_is_rejected() -> TestResult {
    assert_invalid(parse("[publish]\nmode = \"ethers-v5\"\n"), "config parse error")
}

#[test]
fn empty_command_is_rejected() -> TestResult {
    assert_invalid(parse("[commands]\ninstall = []\n"), "commands.install must name a program")
}

#[test]
fn traversing_layout_entry_is_rejected() -> TestResult {
    assert_invalid(
        parse("[layout]\nabi_dir = \"../abi\"\n"),
        "layout.abi_dir must be a relative path without traversal",
    )
}

#[test]
fn absolute_layout_entry_is_rejected() -> TestResult {
    assert_invalid(
        parse("[layout]\ncontracts_dir = \"/contracts\"\n"),
        "layout.contracts_dir must be a relative path without traversal",
    )
}

#[test]
fn nested_readme_name_is_rejected() -> TestResult {
    assert_invalid(
        parse("[layout]\nreadme_file = \"docs/README.md\"\n"),
        "layout.readme_file must be a file name",
    )
}

#[test]
fn colliding_layout_entries_are_rejected() -> TestResult {
    assert_invalid(parse("[layout]\nabi_dir = \"contracts\"\n"), "is used twice")
}

#[test]
fn remapping_prefix_must_end_with_slash() -> TestResult {
    assert_invalid(
        parse("[[remappings]]\nprefix = \"interfaces\"\n"),
        "remappings[0].prefix must end with /",
    )
}

#[test]
fn duplicate_remapping_prefix_is_rejected() -> TestResult {
    let toml = "[[remappings]]\nprefix = \"interfaces/\"\n\n[[remappings]]\nprefix = \"interfaces/\"\ntarget = \"vendor\"\n";
    assert_invalid(parse(toml), "duplicate remapping prefix: interfaces/")
}

#[test]
fn remapping_target_is_normalized() -> TestResult {
    let toml = "[[remappings]]\nprefix = \"@oz/\"\ntarget = \"/vendor/oz/\"\n";
    let config = parse(toml).map_err(|err| err.to_string())?;
    let Some(rule) = config.remappings.first() else {
        return Err("expected one remapping".to_string());
    };
    if rule.target != "vendor/oz" {
        return Err(format!("unexpected normalized target {}", rule.target));
    }
    Ok(())
}

#[test]
fn extension_leading_dot_is_stripped() -> TestResult {
    let config = parse("[interfaces]\nextension = \".vy\"\n").map_err(|err| err.to_string())?;
    if config.interfaces.extension != "vy" {
        return Err(format!("unexpected extension {}", config.interfaces.extension));
    }
    Ok(())
}
