// crates/abi-export-config/src/config.rs
// ============================================================================
// Module: ABI Export Configuration
// Description: Configuration loading and validation for the ABI exporter.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults matching the conventional project layout
//! (`solidity/interfaces`, `yarn` tooling), so a missing default config file
//! is not an error. An explicitly requested file must exist.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::mode::PublishMode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "abi-export.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "ABI_EXPORT_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of remapping rules.
pub(crate) const MAX_REMAPPINGS: usize = 64;
/// Maximum number of arguments in a configured command.
pub(crate) const MAX_COMMAND_ARGS: usize = 64;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// ABI exporter configuration.
///
/// # Invariants
/// - After [`ExportConfig::validate`] succeeds, layout paths are relative and free of traversal,
///   commands are non-empty, and remapping prefixes are unique and end with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Interface source discovery settings.
    #[serde(default)]
    pub interfaces: InterfacesConfig,
    /// Export directory layout.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// README/LICENSE scaffolding settings.
    #[serde(default)]
    pub docs: DocsConfig,
    /// Import path remapping rules.
    #[serde(default = "default_remappings")]
    pub remappings: Vec<RemappingConfig>,
    /// External command settings.
    #[serde(default)]
    pub commands: CommandsConfig,
    /// Publish settings.
    #[serde(default)]
    pub publish: PublishConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            interfaces: InterfacesConfig::default(),
            layout: LayoutConfig::default(),
            docs: DocsConfig::default(),
            remappings: default_remappings(),
            commands: CommandsConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_NAME`] in the working directory. Only the last one may
    /// be absent, in which case built-in defaults apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, required) = resolve_path(path)?;
        validate_path(&resolved)?;
        let file = match fs::File::open(&resolved) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound && !required => {
                let mut config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(err) => return Err(ConfigError::Io(err.to_string())),
        };
        let bytes = read_config_bytes(file)?;
        Self::from_bytes(&bytes)
    }

    /// Parses and validates configuration from raw TOML bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the payload is oversized, not UTF-8, not
    /// valid TOML, or fails validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.interfaces.validate()?;
        self.layout.validate()?;
        self.docs.validate()?;
        self.commands.validate()?;
        validate_remappings(&mut self.remappings)?;
        Ok(())
    }
}

/// Interface source discovery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfacesConfig {
    /// Root directory scanned recursively for interface sources.
    #[serde(default = "default_interfaces_root")]
    pub root: PathBuf,
    /// File extension (without the dot) identifying interface sources.
    #[serde(default = "default_interfaces_extension")]
    pub extension: String,
}

impl Default for InterfacesConfig {
    fn default() -> Self {
        Self {
            root: default_interfaces_root(),
            extension: default_interfaces_extension(),
        }
    }
}

impl InterfacesConfig {
    /// Validates interface discovery settings.
    fn validate(&mut self) -> Result<(), ConfigError> {
        validate_path_string("interfaces.root", &self.root.to_string_lossy())?;
        let extension = self.extension.trim().trim_start_matches('.');
        if extension.is_empty() {
            return Err(ConfigError::Invalid("interfaces.extension must be non-empty".to_string()));
        }
        if extension.contains(['/', '\\', '*']) {
            return Err(ConfigError::Invalid(
                "interfaces.extension must be a plain file extension".to_string(),
            ));
        }
        self.extension = extension.to_string();
        Ok(())
    }
}

/// Export directory layout configuration.
///
/// # Invariants
/// - All entries are relative paths under the export directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Subfolder holding one ABI JSON file per interface.
    #[serde(default = "default_abi_dir")]
    pub abi_dir: String,
    /// Subfolder holding rewritten interface sources.
    #[serde(default = "default_contracts_dir")]
    pub contracts_dir: String,
    /// Package manifest file name.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    /// README file name.
    #[serde(default = "default_readme_file")]
    pub readme_file: String,
    /// LICENSE file name.
    #[serde(default = "default_license_file")]
    pub license_file: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            abi_dir: default_abi_dir(),
            contracts_dir: default_contracts_dir(),
            manifest_file: default_manifest_file(),
            readme_file: default_readme_file(),
            license_file: default_license_file(),
        }
    }
}

impl LayoutConfig {
    /// Validates export layout entries.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_relative_entry("layout.abi_dir", &self.abi_dir, false)?;
        validate_relative_entry("layout.contracts_dir", &self.contracts_dir, false)?;
        validate_relative_entry("layout.manifest_file", &self.manifest_file, true)?;
        validate_relative_entry("layout.readme_file", &self.readme_file, true)?;
        validate_relative_entry("layout.license_file", &self.license_file, true)?;
        let mut seen = BTreeSet::new();
        for entry in [
            &self.abi_dir,
            &self.contracts_dir,
            &self.manifest_file,
            &self.readme_file,
            &self.license_file,
        ] {
            if !seen.insert(entry.as_str()) {
                return Err(ConfigError::Invalid(format!("layout entry {entry} is used twice")));
            }
        }
        Ok(())
    }
}

/// README/LICENSE scaffolding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocsConfig {
    /// License template copied into the package when it exists.
    #[serde(default = "default_license_template")]
    pub license_template: Option<PathBuf>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            license_template: default_license_template(),
        }
    }
}

impl DocsConfig {
    /// Validates docs settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(template) = &self.license_template {
            validate_path_string("docs.license_template", &template.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Import path remapping rule.
///
/// An import path starting with `prefix` is redirected to `target`, a
/// directory relative to the exported contracts folder (empty for its root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemappingConfig {
    /// Import prefix to match; must end with `/`.
    pub prefix: String,
    /// Target directory under the contracts folder.
    #[serde(default)]
    pub target: String,
}

impl RemappingConfig {
    /// Validates a single remapping rule.
    fn validate(&mut self, index: usize) -> Result<(), ConfigError> {
        let prefix = self.prefix.trim();
        if prefix.is_empty() || prefix == "/" {
            return Err(ConfigError::Invalid(format!(
                "remappings[{index}].prefix must be non-empty"
            )));
        }
        if !prefix.ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "remappings[{index}].prefix must end with /"
            )));
        }
        if prefix.chars().any(|ch| ch.is_whitespace() || ch == '\'' || ch == '"') {
            return Err(ConfigError::Invalid(format!(
                "remappings[{index}].prefix contains invalid characters"
            )));
        }
        let target = self.target.trim().trim_matches('/');
        if !target.is_empty() {
            validate_relative_entry(&format!("remappings[{index}].target"), target, false)?;
        }
        self.prefix = prefix.to_string();
        self.target = target.to_string();
        Ok(())
    }
}

/// External command configuration.
///
/// Each command is a program followed by its arguments; no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsConfig {
    /// Dependency install command, run inside the export directory.
    #[serde(default = "default_install_command")]
    pub install: Vec<String>,
    /// Binding generator command; target, output, and glob arguments are appended.
    #[serde(default = "default_bindings_command")]
    pub bindings: Vec<String>,
    /// Working directory for the binding generator.
    #[serde(default = "default_bindings_working_dir")]
    pub bindings_working_dir: PathBuf,
    /// Publish command, run inside the export directory.
    #[serde(default = "default_publish_command")]
    pub publish: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            install: default_install_command(),
            bindings: default_bindings_command(),
            bindings_working_dir: default_bindings_working_dir(),
            publish: default_publish_command(),
        }
    }
}

impl CommandsConfig {
    /// Validates command settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_command("commands.install", &self.install)?;
        validate_command("commands.bindings", &self.bindings)?;
        validate_command("commands.publish", &self.publish)?;
        validate_path_string(
            "commands.bindings_working_dir",
            &self.bindings_working_dir.to_string_lossy(),
        )
    }
}

/// Publish configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Default publish mode when the CLI does not override it.
    #[serde(default)]
    pub mode: PublishMode,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and whether it must exist.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Reads an opened config file, refusing anything over the size limit.
fn read_config_bytes(file: fs::File) -> Result<Vec<u8>, ConfigError> {
    let limit = u64::try_from(MAX_CONFIG_FILE_SIZE)
        .map_err(|_| ConfigError::Invalid("config size limit out of range".to_string()))?;
    let metadata = file.metadata().map_err(|err| ConfigError::Io(err.to_string()))?;
    if metadata.len() > limit {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    let mut bytes = Vec::new();
    file.take(limit + 1).read_to_end(&mut bytes).map_err(|err| ConfigError::Io(err.to_string()))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    Ok(bytes)
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an entry that must stay inside the export directory.
///
/// When `single` is set the entry must be a bare file name.
fn validate_relative_entry(field: &str, value: &str, single: bool) -> Result<(), ConfigError> {
    validate_path_string(field, value)?;
    if value.contains('\\') {
        return Err(ConfigError::Invalid(format!("{field} must use / separators")));
    }
    let path = Path::new(value);
    let mut count = 0_usize;
    for component in path.components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(ConfigError::Invalid(format!(
                "{field} must be a relative path without traversal"
            )));
        }
        count += 1;
    }
    if single && count != 1 {
        return Err(ConfigError::Invalid(format!("{field} must be a file name")));
    }
    Ok(())
}

/// Validates a configured command vector.
fn validate_command(field: &str, command: &[String]) -> Result<(), ConfigError> {
    let Some(program) = command.first() else {
        return Err(ConfigError::Invalid(format!("{field} must name a program")));
    };
    if program.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must name a program")));
    }
    if command.len() > MAX_COMMAND_ARGS {
        return Err(ConfigError::Invalid(format!("{field} has too many arguments")));
    }
    Ok(())
}

/// Validates and normalizes the remapping rule set.
fn validate_remappings(remappings: &mut [RemappingConfig]) -> Result<(), ConfigError> {
    if remappings.len() > MAX_REMAPPINGS {
        return Err(ConfigError::Invalid(format!(
            "remappings exceeds max entries ({MAX_REMAPPINGS})"
        )));
    }
    let mut seen = BTreeSet::new();
    for (index, remapping) in remappings.iter_mut().enumerate() {
        remapping.validate(index)?;
        if !seen.insert(remapping.prefix.clone()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate remapping prefix: {}",
                remapping.prefix
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default interfaces root.
fn default_interfaces_root() -> PathBuf {
    PathBuf::from("solidity/interfaces")
}

/// Default interface source extension.
fn default_interfaces_extension() -> String {
    "sol".to_string()
}

/// Default ABI subfolder.
fn default_abi_dir() -> String {
    "abi".to_string()
}

/// Default contracts subfolder.
fn default_contracts_dir() -> String {
    "contracts".to_string()
}

/// Default package manifest name.
fn default_manifest_file() -> String {
    "package.json".to_string()
}

/// Default README name.
fn default_readme_file() -> String {
    "README.MD".to_string()
}

/// Default LICENSE name.
fn default_license_file() -> String {
    "LICENSE".to_string()
}

/// Default license template location.
#[allow(clippy::unnecessary_wraps, reason = "serde default for an optional field")]
fn default_license_template() -> Option<PathBuf> {
    Some(PathBuf::from("LICENSE"))
}

/// Default remapping: `interfaces/` resolves to the contracts root.
fn default_remappings() -> Vec<RemappingConfig> {
    vec![RemappingConfig {
        prefix: "interfaces/".to_string(),
        target: String::new(),
    }]
}

/// Default install command.
fn default_install_command() -> Vec<String> {
    vec!["yarn".to_string()]
}

/// Default binding generator command.
fn default_bindings_command() -> Vec<String> {
    vec!["yarn".to_string(), "typechain".to_string()]
}

/// Default binding generator working directory.
fn default_bindings_working_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Default publish command.
fn default_publish_command() -> Vec<String> {
    vec![
        "yarn".to_string(),
        "publish".to_string(),
        "--access".to_string(),
        "public".to_string(),
    ]
}
