// crates/abi-export/src/descriptor.rs
// ============================================================================
// Module: Package Descriptor
// Description: Package manifest model written into the export directory.
// Purpose: Load, validate, and serialize the caller-supplied package metadata.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`PackageDescriptor`] is the package manifest the caller supplies. Only
//! `name` is interpreted; every other field is carried through verbatim. The
//! descriptor is written once, at the start of a run, and never mutated.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::ExportError;

// ============================================================================
// CONSTANTS: Descriptor limits
// ============================================================================

/// Maximum descriptor file size accepted by [`PackageDescriptor::load`].
pub const MAX_DESCRIPTOR_BYTES: u64 = 1024 * 1024;

/// Maximum registry package name length.
pub const MAX_PACKAGE_NAME_LENGTH: usize = 214;

/// Package manifest supplied by the caller.
///
/// # Invariants
/// - `name` passes [`validate_package_name`] once constructed through [`PackageDescriptor::new`],
///   [`PackageDescriptor::from_slice`], or [`PackageDescriptor::load`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Registry package name.
    pub name: String,
    /// Remaining manifest fields, preserved verbatim.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl PackageDescriptor {
    /// Creates a descriptor from a name and metadata.
    ///
    /// # Errors
    /// Returns [`ExportError::Descriptor`] when the name is not a valid registry name.
    pub fn new(name: impl Into<String>, metadata: Map<String, Value>) -> Result<Self, ExportError> {
        let descriptor = Self {
            name: name.into(),
            metadata,
        };
        validate_package_name(&descriptor.name)?;
        Ok(descriptor)
    }

    /// Parses a descriptor from JSON bytes.
    ///
    /// # Errors
    /// Returns [`ExportError::Descriptor`] when the payload is not a JSON object
    /// with a valid `name`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ExportError> {
        let descriptor: Self = serde_json::from_slice(bytes)
            .map_err(|err| ExportError::Descriptor(err.to_string()))?;
        validate_package_name(&descriptor.name)?;
        Ok(descriptor)
    }

    /// Loads a descriptor from a JSON file with a hard size limit.
    ///
    /// # Errors
    /// Returns [`ExportError::Descriptor`] when the file is unreadable, too
    /// large, or invalid.
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let file = fs::File::open(path).map_err(|err| {
            ExportError::Descriptor(format!("unable to read {}: {err}", path.display()))
        })?;
        let metadata = file.metadata().map_err(|err| ExportError::Descriptor(err.to_string()))?;
        if metadata.len() > MAX_DESCRIPTOR_BYTES {
            return Err(ExportError::Descriptor(format!(
                "descriptor exceeds {MAX_DESCRIPTOR_BYTES} bytes"
            )));
        }
        let mut bytes = Vec::new();
        let mut limited = file.take(MAX_DESCRIPTOR_BYTES + 1);
        limited.read_to_end(&mut bytes).map_err(|err| ExportError::Descriptor(err.to_string()))?;
        let size = u64::try_from(bytes.len()).map_err(|_| {
            ExportError::Descriptor("descriptor size exceeds addressable memory".to_string())
        })?;
        if size > MAX_DESCRIPTOR_BYTES {
            return Err(ExportError::Descriptor(format!(
                "descriptor exceeds {MAX_DESCRIPTOR_BYTES} bytes"
            )));
        }
        Self::from_slice(&bytes)
    }

    /// Renders the manifest bytes: four-space indentation plus a trailing newline.
    ///
    /// # Errors
    /// Returns [`ExportError::Descriptor`] when serialization fails.
    pub fn to_manifest_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let mut bytes = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
        self.serialize(&mut serializer).map_err(|err| ExportError::Descriptor(err.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Validates a registry package name.
///
/// Accepts `name` or `@scope/name`; both parts are lowercase, non-empty, free
/// of whitespace and URL-unsafe characters, and do not start with `.` or `_`.
///
/// # Errors
/// Returns [`ExportError::Descriptor`] describing the first violation.
pub fn validate_package_name(name: &str) -> Result<(), ExportError> {
    if name.is_empty() {
        return Err(ExportError::Descriptor("package name must be non-empty".to_string()));
    }
    if name.len() > MAX_PACKAGE_NAME_LENGTH {
        return Err(ExportError::Descriptor(format!(
            "package name exceeds {MAX_PACKAGE_NAME_LENGTH} characters"
        )));
    }
    let parts: Vec<&str> = match name.strip_prefix('@') {
        Some(scoped) => {
            let Some((scope, bare)) = scoped.split_once('/') else {
                return Err(ExportError::Descriptor(format!(
                    "scoped package name must be @scope/name: {name}"
                )));
            };
            vec![scope, bare]
        }
        None => vec![name],
    };
    for part in parts {
        validate_name_part(name, part)?;
    }
    Ok(())
}

/// Validates one segment of a package name.
fn validate_name_part(name: &str, part: &str) -> Result<(), ExportError> {
    if part.is_empty() {
        return Err(ExportError::Descriptor(format!("package name has an empty segment: {name}")));
    }
    if part.starts_with('.') || part.starts_with('_') {
        return Err(ExportError::Descriptor(format!(
            "package name segment must not start with . or _: {name}"
        )));
    }
    let valid = part.chars().all(|ch| {
        ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '-' | '.' | '_' | '~')
    });
    if !valid {
        return Err(ExportError::Descriptor(format!(
            "package name must be lowercase and url-safe: {name}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        clippy::missing_docs_in_private_items,
        reason = "Test-only assertions use panic-based checks."
    )]

    use serde_json::Map;
    use serde_json::Value;
    use serde_json::json;

    use super::PackageDescriptor;
    use super::validate_package_name;
    use crate::ExportError;

    #[test]
    fn accepts_plain_and_scoped_names() -> Result<(), ExportError> {
        validate_package_name("test-package")?;
        validate_package_name("@defi-wonderland/prophet-core-abi")?;
        validate_package_name("pkg.v2_abi~x")?;
        Ok(())
    }

    #[test]
    fn rejects_invalid_names() {
        for name in ["", "Upper", "has space", ".hidden", "_private", "@scope", "@/name", "@s/", "a/b"]
        {
            assert!(validate_package_name(name).is_err(), "expected {name} to be rejected");
        }
        assert!(validate_package_name(&"a".repeat(215)).is_err());
    }

    #[test]
    fn manifest_uses_four_space_indent_and_preserves_fields() -> Result<(), ExportError> {
        let descriptor = PackageDescriptor::from_slice(
            br#"{"name":"test-package","version":"1.2.3","dependencies":{"ethers":"6.0.0"}}"#,
        )?;
        let bytes = descriptor.to_manifest_bytes()?;
        let text = String::from_utf8(bytes).map_err(|err| ExportError::Descriptor(err.to_string()))?;
        assert!(text.starts_with("{\n    \"name\": \"test-package\""));
        assert!(text.ends_with("}\n"));
        let parsed: Value =
            serde_json::from_str(&text).map_err(|err| ExportError::Descriptor(err.to_string()))?;
        assert_eq!(
            parsed,
            json!({"name": "test-package", "version": "1.2.3", "dependencies": {"ethers": "6.0.0"}})
        );
        Ok(())
    }

    #[test]
    fn missing_name_is_rejected() {
        let result = PackageDescriptor::from_slice(br#"{"version":"1.0.0"}"#);
        assert!(matches!(result, Err(ExportError::Descriptor(_))));
    }

    #[test]
    fn new_validates_name() {
        assert!(PackageDescriptor::new("Bad Name", Map::new()).is_err());
        assert!(PackageDescriptor::new("good-name", Map::new()).is_ok());
    }
}
