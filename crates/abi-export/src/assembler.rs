// crates/abi-export/src/assembler.rs
// ============================================================================
// Module: Package Assembler
// Description: Orchestrates staging, install, binding generation, and publish.
// Purpose: Turn interface sources and ABIs into a published package.
// Dependencies: abi-export-config, tracing
// ============================================================================

//! ## Overview
//! A run moves through a fixed sequence of stages:
//!
//! `Init → DirReset → DocsWritten → InterfacesDiscovered → InterfacesCopied →
//! DepsInstalled → [BindingsGenerated] → Published | PublishFailed`
//!
//! Every stage before publish is fatal on failure and nothing is rolled back.
//! Publish failure is the only locally handled error: it is logged and
//! returned as [`PublishOutcome::Failed`]. No step is retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use abi_export_config::ExportConfig;
use abi_export_config::PublishMode;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::ExportError;
use crate::descriptor::PackageDescriptor;
use crate::interface::InterfaceArtifact;
use crate::interface::discover_interfaces;
use crate::output::ExportDir;
use crate::remap::Remapper;
use crate::runner::CommandRunner;
use crate::runner::CommandSpec;
use crate::runner::StdioMode;
use crate::scaffold::ScaffoldSettings;
use crate::scaffold::scaffold_into;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Per-invocation assembly inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyRequest {
    /// Staging directory that becomes the package root.
    pub export_dir: PathBuf,
    /// Build output directory holding `<file name>/<name>.json` artifacts.
    pub build_out_dir: PathBuf,
    /// Package manifest written at the start of the run.
    pub descriptor: PackageDescriptor,
    /// Binding generation mode.
    pub mode: PublishMode,
}

/// Assembly state machine stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStage {
    /// Nothing has happened yet.
    Init,
    /// Export directory emptied and manifest written.
    DirReset,
    /// README and LICENSE written.
    DocsWritten,
    /// Interface set enumerated.
    InterfacesDiscovered,
    /// Every interface source and ABI copied.
    InterfacesCopied,
    /// Package dependencies installed.
    DepsInstalled,
    /// Typed bindings generated.
    BindingsGenerated,
    /// Package published.
    Published,
    /// Publish attempted and failed.
    PublishFailed,
}

impl AssemblyStage {
    /// Returns the stage name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::DirReset => "dir_reset",
            Self::DocsWritten => "docs_written",
            Self::InterfacesDiscovered => "interfaces_discovered",
            Self::InterfacesCopied => "interfaces_copied",
            Self::DepsInstalled => "deps_installed",
            Self::BindingsGenerated => "bindings_generated",
            Self::Published => "published",
            Self::PublishFailed => "publish_failed",
        }
    }
}

/// Result of the staging half of a run (reset through copy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// Absolute export directory path.
    pub export_dir: PathBuf,
    /// Names of the copied interfaces, in processing order.
    pub interfaces: Vec<String>,
    /// Whether a LICENSE file was written.
    pub license_written: bool,
}

impl StageReport {
    /// Number of interfaces copied.
    #[must_use]
    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }
}

/// Final publish result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Publish command succeeded.
    Published,
    /// Publish command failed; the reason was logged.
    Failed {
        /// Failure description.
        reason: String,
    },
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Staging summary.
    pub staged: StageReport,
    /// Bindings output directory, when bindings were generated.
    pub bindings_dir: Option<PathBuf>,
    /// Publish result.
    pub outcome: PublishOutcome,
}

// ============================================================================
// SECTION: Assembler
// ============================================================================

/// Package assembler driving the full export sequence.
///
/// # Invariants
/// - External commands run only after every interface has been copied, in the order install,
///   bindings, publish.
/// - Each external command is attempted at most once per run.
#[derive(Debug)]
pub struct PackageAssembler<R> {
    /// Exporter configuration.
    config: ExportConfig,
    /// Import remapper derived from the configuration.
    remapper: Remapper,
    /// Scaffold settings derived from the configuration.
    scaffold: ScaffoldSettings,
    /// External command runner.
    runner: R,
}

impl<R: CommandRunner> PackageAssembler<R> {
    /// Creates an assembler from a validated configuration and a runner.
    #[must_use]
    pub fn new(config: ExportConfig, runner: R) -> Self {
        let remapper = Remapper::new(&config.remappings);
        let scaffold = ScaffoldSettings::from_config(&config);
        Self {
            config,
            remapper,
            scaffold,
            runner,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Returns the command runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs the full sequence: stage, install, optional bindings, publish.
    ///
    /// # Errors
    /// Returns [`ExportError`] for any failure before publish. Publish failure
    /// is reported through [`AssemblyReport::outcome`].
    pub fn run(&self, request: &AssemblyRequest) -> Result<AssemblyReport, ExportError> {
        let staged = self.stage(request)?;
        let export_dir = staged.export_dir.clone();

        info!("installing package dependencies");
        let install = self.command(&self.config.commands.install, &export_dir, StdioMode::Captured)?;
        self.run_checked(&install)?;
        enter(AssemblyStage::DepsInstalled);

        let bindings_dir = match request.mode.binding_target() {
            Some(target) => {
                let out_dir = export_dir.join(target);
                info!(target, "generating typed bindings");
                let abi_glob =
                    format!("{}/{}/*.json", export_dir.display(), self.config.layout.abi_dir);
                let bindings = self
                    .command(
                        &self.config.commands.bindings,
                        &self.config.commands.bindings_working_dir,
                        StdioMode::Captured,
                    )?
                    .arg("--target")
                    .arg(target)
                    .arg("--out-dir")
                    .arg(out_dir.display().to_string())
                    .arg(abi_glob);
                self.run_checked(&bindings)?;
                enter(AssemblyStage::BindingsGenerated);
                Some(out_dir)
            }
            None => None,
        };

        let outcome = self.publish(&export_dir)?;
        Ok(AssemblyReport {
            staged,
            bindings_dir,
            outcome,
        })
    }

    /// Stages the export directory without running external commands.
    ///
    /// # Errors
    /// Returns [`ExportError`] when reset, scaffolding, discovery, or copying fails.
    pub fn stage(&self, request: &AssemblyRequest) -> Result<StageReport, ExportError> {
        enter(AssemblyStage::Init);
        let dir = self.reset_export_dir(&request.export_dir, &request.descriptor)?;
        enter(AssemblyStage::DirReset);

        let docs = scaffold_into(&dir, &request.descriptor.name, &self.scaffold)?;
        enter(AssemblyStage::DocsWritten);

        let interfaces =
            discover_interfaces(&self.config.interfaces.root, &self.config.interfaces.extension)?;
        enter(AssemblyStage::InterfacesDiscovered);

        let mut names = Vec::with_capacity(interfaces.len());
        for interface in &interfaces {
            self.copy_interface(&dir, interface, &request.build_out_dir)?;
            names.push(interface.interface_name().to_string());
        }
        enter(AssemblyStage::InterfacesCopied);
        info!(count = names.len(), "copied interfaces");

        Ok(StageReport {
            export_dir: dir.path().to_path_buf(),
            interfaces: names,
            license_written: docs.license_written,
        })
    }

    /// Empties (or creates) the export directory and writes the manifest.
    ///
    /// Running it twice in a row leaves identical directory contents.
    ///
    /// # Errors
    /// Returns [`ExportError`] when the directory cannot be reset or written.
    pub fn reset_export_dir(
        &self,
        export_dir: &Path,
        descriptor: &PackageDescriptor,
    ) -> Result<ExportDir, ExportError> {
        let dir = ExportDir::open(export_dir, true)?;
        dir.reset()?;
        let manifest = descriptor.to_manifest_bytes()?;
        dir.write_file(Path::new(&self.config.layout.manifest_file), &manifest)?;
        debug!(path = %dir.path().display(), "export directory reset");
        Ok(dir)
    }

    /// Copies one interface's rewritten source and compiled ABI.
    fn copy_interface(
        &self,
        dir: &ExportDir,
        interface: &InterfaceArtifact,
        build_out_dir: &Path,
    ) -> Result<(), ExportError> {
        let source = interface.read_source()?;
        let rewritten = self.remapper.transform(&source, interface.relative_path());
        let contract_path = Path::new(&self.config.layout.contracts_dir).join(interface.relative_path());
        dir.write_file(&contract_path, rewritten.as_bytes())?;

        let artifact_path = interface.compiled_artifact_path(build_out_dir);
        let artifact = fs::read(&artifact_path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                ExportError::ArtifactNotFound {
                    interface: interface.interface_name().to_string(),
                    path: artifact_path.clone(),
                }
            } else {
                ExportError::FileSystem(format!(
                    "unable to read {}: {err}",
                    artifact_path.display()
                ))
            }
        })?;
        let abi_path = Path::new(&self.config.layout.abi_dir)
            .join(format!("{}.json", interface.interface_name()));
        dir.write_file(&abi_path, &artifact)?;
        debug!(interface = interface.interface_name(), "copied interface");
        Ok(())
    }

    /// Runs the publish command and converts failure into an outcome.
    fn publish(&self, export_dir: &Path) -> Result<PublishOutcome, ExportError> {
        info!("publishing package");
        let publish = self.command(&self.config.commands.publish, export_dir, StdioMode::Inherited)?;
        let result = match self.runner.run(&publish) {
            Ok(status) if status.is_success() => Ok(()),
            Ok(status) => Err(status.describe()),
            Err(err) => Err(err.to_string()),
        };
        match result {
            Ok(()) => {
                enter(AssemblyStage::Published);
                info!("package published");
                Ok(PublishOutcome::Published)
            }
            Err(reason) => {
                enter(AssemblyStage::PublishFailed);
                error!(command = %publish, %reason, "failed to publish the package");
                Ok(PublishOutcome::Failed {
                    reason,
                })
            }
        }
    }

    /// Builds a command spec from a configured command vector.
    fn command(
        &self,
        parts: &[String],
        working_dir: &Path,
        stdio: StdioMode,
    ) -> Result<CommandSpec, ExportError> {
        CommandSpec::from_parts(parts, working_dir, stdio).ok_or_else(|| {
            ExportError::ExternalProcess {
                command: String::new(),
                detail: "command is empty".to_string(),
            }
        })
    }

    /// Runs a command and fails on spawn errors or non-zero exit.
    fn run_checked(&self, command: &CommandSpec) -> Result<(), ExportError> {
        debug!(command = %command, "running command");
        let status = self.runner.run(command).map_err(|err| ExportError::ExternalProcess {
            command: command.to_string(),
            detail: err.to_string(),
        })?;
        if !status.is_success() {
            return Err(ExportError::ExternalProcess {
                command: command.to_string(),
                detail: status.describe(),
            });
        }
        Ok(())
    }
}

/// Logs a state machine transition.
fn enter(stage: AssemblyStage) {
    debug!(stage = stage.as_str(), "assembly stage");
}

// ============================================================================
// SECTION: Tests
// ============================================================================
