// crates/abi-export/src/scaffold.rs
// ============================================================================
// Module: Readme/License Scaffolder
// Description: Writes package documentation into the export directory.
// Purpose: Give every published package a README and, when available, a LICENSE.
// Dependencies: abi-export-config, std
// ============================================================================

//! ## Overview
//! The scaffolder writes a README whose heading is `## <package name>` and
//! copies the license template when one exists. A missing template is not an
//! error: the package is simply published without a LICENSE file.

use std::fmt::Write;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use abi_export_config::ExportConfig;
use tracing::debug;

use crate::ExportError;
use crate::output::ExportDir;

/// File names and template location used by the scaffolder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldSettings {
    /// README file name.
    pub readme_file: String,
    /// LICENSE file name.
    pub license_file: String,
    /// License template to copy, if any.
    pub license_template: Option<PathBuf>,
    /// ABI subfolder name, listed in the README.
    pub abi_dir: String,
    /// Contracts subfolder name, listed in the README.
    pub contracts_dir: String,
    /// Package manager named in the README install snippet.
    pub package_manager: String,
}

impl ScaffoldSettings {
    /// Derives scaffold settings from the exporter configuration.
    #[must_use]
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            readme_file: config.layout.readme_file.clone(),
            license_file: config.layout.license_file.clone(),
            license_template: config.docs.license_template.clone(),
            abi_dir: config.layout.abi_dir.clone(),
            contracts_dir: config.layout.contracts_dir.clone(),
            package_manager: package_manager(&config.commands.install),
        }
    }
}

impl Default for ScaffoldSettings {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

/// Result of a scaffold pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaffoldReport {
    /// Whether a LICENSE file was written.
    pub license_written: bool,
}

/// Writes the README and LICENSE into `target_dir`, creating it if absent.
///
/// # Errors
/// Returns [`ExportError`] when the directory cannot be created or written,
/// or when an existing license template cannot be read.
pub fn write_readme_and_license(
    package_name: &str,
    target_dir: &Path,
    settings: &ScaffoldSettings,
) -> Result<ScaffoldReport, ExportError> {
    let dir = ExportDir::open(target_dir, true)?;
    scaffold_into(&dir, package_name, settings)
}

/// Writes the README and LICENSE through an already opened export directory.
pub(crate) fn scaffold_into(
    dir: &ExportDir,
    package_name: &str,
    settings: &ScaffoldSettings,
) -> Result<ScaffoldReport, ExportError> {
    let readme = render_readme(package_name, settings);
    dir.write_file(Path::new(&settings.readme_file), readme.as_bytes())?;

    let license = match &settings.license_template {
        Some(template) => read_license_template(template)?,
        None => None,
    };
    let license_written = match license {
        Some(bytes) => {
            dir.write_file(Path::new(&settings.license_file), &bytes)?;
            true
        }
        None => {
            debug!(file = %settings.license_file, "no license template; skipping");
            false
        }
    };
    Ok(ScaffoldReport {
        license_written,
    })
}

/// Reads the license template, returning `None` when it does not exist.
fn read_license_template(template: &Path) -> Result<Option<Vec<u8>>, ExportError> {
    match fs::read(template) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ExportError::FileSystem(format!(
            "unable to read license template {}: {err}",
            template.display()
        ))),
    }
}

/// Returns the program name of the configured install command.
fn package_manager(install: &[String]) -> String {
    install
        .first()
        .and_then(|program| Path::new(program).file_stem())
        .map_or_else(|| "npm".to_string(), |stem| stem.to_string_lossy().into_owned())
}

/// Renders the install command for the README.
///
/// Unrecognized tools fall back to `npm install`.
fn install_line(package_manager: &str, package_name: &str) -> String {
    match package_manager {
        "yarn" | "pnpm" | "bun" => format!("{package_manager} add {package_name}"),
        _ => format!("npm install {package_name}"),
    }
}

/// Renders the README body.
fn render_readme(package_name: &str, settings: &ScaffoldSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {package_name}");
    out.push('\n');
    out.push_str("Contract interfaces and ABIs packaged for integrators.\n\n");
    out.push_str("### Installation\n\n");
    let _ = writeln!(out, "```sh\n{}\n```", install_line(&settings.package_manager, package_name));
    out.push('\n');
    out.push_str("### Contents\n\n");
    let _ = writeln!(out, "- `{}/`: compiled ABI JSON, one file per interface.", settings.abi_dir);
    let _ = writeln!(
        out,
        "- `{}/`: interface sources with imports rewritten as relative paths.",
        settings.contracts_dir
    );
    out
}
