// crates/abi-export-config/src/mode.rs
// ============================================================================
// Module: Publish Modes
// Description: Recognized publish modes and their binding targets.
// Purpose: Map a publish mode onto the binding generator target it requires.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`PublishMode`] selects which typed-binding target, if any, is generated
//! before the package is published. The mapping is closed: unknown mode names
//! are rejected at parse time.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::ConfigError;

/// Publish mode selecting the binding generator target.
///
/// # Invariants
/// - [`PublishMode::as_str`] round-trips through [`PublishMode::from_str`].
/// - Modes with a binding target emit bindings into a subdirectory named after the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishMode {
    /// Publish ABI JSON and interface sources only.
    #[default]
    Abi,
    /// Generate ethers v6 bindings.
    EthersV6,
    /// Generate web3 v1 bindings.
    Web3V1,
}

impl PublishMode {
    /// All recognized publish modes in declaration order.
    pub const ALL: [Self; 3] = [Self::Abi, Self::EthersV6, Self::Web3V1];

    /// Returns the canonical mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abi => "abi",
            Self::EthersV6 => "ethers-v6",
            Self::Web3V1 => "web3-v1",
        }
    }

    /// Returns the binding generator target, or `None` when no bindings are generated.
    #[must_use]
    pub const fn binding_target(self) -> Option<&'static str> {
        match self {
            Self::Abi => None,
            Self::EthersV6 => Some("ethers-v6"),
            Self::Web3V1 => Some("web3-v1"),
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value.trim()).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|mode| mode.as_str()).collect();
            ConfigError::Invalid(format!(
                "unknown publish mode {value}; expected one of {}",
                known.join(", ")
            ))
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
