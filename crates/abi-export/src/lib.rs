// crates/abi-export/src/lib.rs
// ============================================================================
// Module: ABI Export Library
// Description: Packaging pipeline for contract interface ABIs and sources.
// Purpose: Stage an export directory and hand it to external tooling.
// Dependencies: abi-export-config, cap-std, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! `abi-export` turns a tree of interface sources plus their compiled ABI JSON
//! into a publishable library package. The [`PackageAssembler`] resets the
//! export directory, writes the package manifest and docs, copies every
//! interface (with import paths remapped for the flattened layout), then runs
//! the configured install, binding generator, and publish commands through an
//! injected [`CommandRunner`].
//!
//! ### Design Notes
//! - Discovery completes before any interface is copied, and interfaces are processed in sorted
//!   relative-path order so repeated runs produce identical output.
//! - Every failure before publish aborts the run; the export directory is left as-is.
//! - Publish failure is reported as [`PublishOutcome::Failed`] rather than an error so the caller
//!   controls the exit status.
//!
//! ## Index
//! - Orchestration: [`PackageAssembler`], [`AssemblyRequest`], [`StageReport`]
//! - Leaves: [`Remapper`], [`scaffold::write_readme_and_license`], [`interface::discover_interfaces`]
//! - Seams: [`CommandRunner`], [`SystemCommandRunner`]

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assembler;
pub mod descriptor;
pub mod interface;
pub mod output;
pub mod remap;
pub mod runner;
pub mod scaffold;

// ============================================================================
// SECTION: Errors
// ============================================================================

use std::path::PathBuf;

use abi_export_config::ConfigError;
use thiserror::Error;

/// Errors raised while assembling and publishing a package.
///
/// # Invariants
/// - Variant meanings are stable for automation and tests.
/// - [`ExportError::ArtifactNotFound`] always names the interface and the expected path.
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO failure while resetting, scaffolding, or copying.
    #[error("filesystem error: {0}")]
    FileSystem(String),
    /// Interfaces root missing, unreadable, or inconsistent.
    #[error("discovery error: {0}")]
    Discovery(String),
    /// Compiled artifact for a discovered interface is missing.
    #[error("compiled artifact for {interface} not found at {}", path.display())]
    ArtifactNotFound {
        /// Interface name.
        interface: String,
        /// Expected artifact location.
        path: PathBuf,
    },
    /// External command failed to start or exited unsuccessfully.
    #[error("command `{command}` failed: {detail}")]
    ExternalProcess {
        /// Rendered command line.
        command: String,
        /// Exit status or spawn failure.
        detail: String,
    },
    /// Package descriptor invalid or unreadable.
    #[error("package descriptor error: {0}")]
    Descriptor(String),
    /// Output path invalid or inaccessible.
    #[error("invalid output path: {}", .0.display())]
    OutputPath(PathBuf),
    /// Configuration invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use assembler::AssemblyReport;
pub use assembler::AssemblyRequest;
pub use assembler::AssemblyStage;
pub use assembler::PackageAssembler;
pub use assembler::PublishOutcome;
pub use assembler::StageReport;
pub use descriptor::PackageDescriptor;
pub use interface::InterfaceArtifact;
pub use remap::Remapper;
pub use runner::CommandRunner;
pub use runner::CommandSpec;
pub use runner::CommandStatus;
pub use runner::StdioMode;
pub use runner::SystemCommandRunner;
