// crates/abi-export-config/src/lib.rs
// ============================================================================
// Module: ABI Export Config Library
// Description: Canonical config model and validation for the ABI exporter.
// Purpose: Single source of truth for abi-export.toml semantics.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! `abi-export-config` defines the configuration consumed by the package
//! assembler: where interface sources live, how the export directory is laid
//! out, which import prefixes get remapped, and which external commands run
//! for install, binding generation, and publish.
//!
//! Loading is strict and fails closed: oversized, non-UTF-8, unknown-field, or
//! internally inconsistent files are rejected before any work starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod mode;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use mode::PublishMode;
