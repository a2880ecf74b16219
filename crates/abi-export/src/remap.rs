// crates/abi-export/src/remap.rs
// ============================================================================
// Module: Import Remapping
// Description: Rewrites remapped import paths into export-relative paths.
// Purpose: Keep interface imports resolvable after relocation into the package.
// Dependencies: abi-export-config
// ============================================================================

//! ## Overview
//! Interface sources import each other through remapped prefixes such as
//! `interfaces/IFoo.sol`, which only resolve inside the originating project.
//! Once copied into `<export>/contracts`, those imports must become plain
//! relative paths. [`Remapper::transform`] rewrites them and leaves every other
//! byte of the source untouched.
//!
//! Only string literals that directly follow an `import` or `from` keyword are
//! considered. Comments and ordinary string literals are skipped, and a
//! literal is rewritten only when it starts with a configured prefix exactly.

use std::path::Component;
use std::path::Path;

use abi_export_config::RemappingConfig;

/// Import remapping rule set.
///
/// # Invariants
/// - Rules are ordered by descending prefix length so the most specific prefix wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remapper {
    /// Rules sorted longest prefix first.
    rules: Vec<Rule>,
}

/// Single remapping rule with its target split into path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    /// Import prefix, ending with `/`.
    prefix: String,
    /// Target directory segments under the contracts root.
    target: Vec<String>,
}

impl Remapper {
    /// Builds a remapper from validated configuration rules.
    #[must_use]
    pub fn new(remappings: &[RemappingConfig]) -> Self {
        let mut rules: Vec<Rule> = remappings
            .iter()
            .map(|remapping| Rule {
                prefix: remapping.prefix.clone(),
                target: split_segments(&remapping.target),
            })
            .collect();
        rules.sort_by(|lhs, rhs| rhs.prefix.len().cmp(&lhs.prefix.len()));
        Self {
            rules,
        }
    }

    /// Rewrites remapped imports in `source`.
    ///
    /// `location` is the file's path relative to the contracts root of the
    /// export directory (which mirrors the interfaces root); rewritten imports
    /// are relative to its parent directory.
    #[must_use]
    pub fn transform(&self, source: &str, location: &Path) -> String {
        if self.rules.is_empty() {
            return source.to_string();
        }
        let from_dir = parent_segments(location);
        let bytes = source.as_bytes();
        let mut output = String::with_capacity(source.len());
        let mut copied = 0;
        let mut index = 0;
        let mut keyword = Keyword::Other;
        while index < bytes.len() {
            match bytes[index] {
                b'/' if bytes.get(index + 1) == Some(&b'/') => {
                    index = skip_line_comment(bytes, index);
                }
                b'/' if bytes.get(index + 1) == Some(&b'*') => {
                    index = skip_block_comment(bytes, index);
                }
                quote @ (b'"' | b'\'') => {
                    let start = index + 1;
                    let (end, closed) = find_literal_end(bytes, start, quote);
                    if closed
                        && keyword == Keyword::Import
                        && let Some(rewritten) = self.rewrite(&source[start .. end], &from_dir)
                    {
                        output.push_str(&source[copied .. start]);
                        output.push_str(&rewritten);
                        copied = end;
                    }
                    keyword = Keyword::Other;
                    index = if closed { end + 1 } else { end };
                }
                byte if is_identifier_byte(byte) => {
                    let start = index;
                    while index < bytes.len() && is_identifier_byte(bytes[index]) {
                        index += 1;
                    }
                    keyword = match &source[start .. index] {
                        "import" | "from" => Keyword::Import,
                        _ => Keyword::Other,
                    };
                }
                byte if byte.is_ascii_whitespace() => index += 1,
                _ => {
                    keyword = Keyword::Other;
                    index += 1;
                }
            }
        }
        output.push_str(&source[copied ..]);
        output
    }

    /// Returns the rewritten import path, or `None` when no rule applies.
    fn rewrite(&self, literal: &str, from_dir: &[String]) -> Option<String> {
        let rule = self.rules.iter().find(|rule| literal.starts_with(&rule.prefix))?;
        let remainder = &literal[rule.prefix.len() ..];
        let mut target = rule.target.clone();
        target.extend(remainder.split('/').filter(|segment| !segment.is_empty()).map(String::from));
        Some(relative_import(from_dir, &target))
    }
}

/// Last significant token before a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    /// `import` or `from`.
    Import,
    /// Anything else.
    Other,
}

/// Builds a `./` or `../` relative path from `from_dir` to `target`.
fn relative_import(from_dir: &[String], target: &[String]) -> String {
    let common = from_dir
        .iter()
        .zip(target.iter())
        .take_while(|(lhs, rhs)| lhs == rhs && lhs.as_str() != ".." && lhs.as_str() != ".")
        .count();
    let ups = from_dir.len() - common;
    let mut path = if ups == 0 { String::from("./") } else { "../".repeat(ups) };
    path.push_str(&target[common ..].join("/"));
    path
}

/// Splits a `/`-separated directory into non-empty segments.
fn split_segments(value: &str) -> Vec<String> {
    value.split('/').filter(|segment| !segment.is_empty()).map(String::from).collect()
}

/// Returns the normal components of the parent directory of `location`.
fn parent_segments(location: &Path) -> Vec<String> {
    location
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|component| match component {
                    Component::Normal(value) => Some(value.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Returns true for bytes that can appear in an identifier.
const fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

/// Returns the index just past a `//` comment (the newline is left in place).
fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start ..]
        .iter()
        .position(|byte| *byte == b'\n')
        .map_or(bytes.len(), |offset| start + offset)
}

/// Returns the index just past a `/* */` comment.
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut index = start + 2;
    while index + 1 < bytes.len() {
        if bytes[index] == b'*' && bytes[index + 1] == b'/' {
            return index + 2;
        }
        index += 1;
    }
    bytes.len()
}

/// Returns the end of a string literal and whether it was closed.
///
/// A closed literal ends at its closing quote. An unterminated literal ends at
/// the next newline (or end of input) so scanning resumes on the next line.
fn find_literal_end(bytes: &[u8], start: usize, quote: u8) -> (usize, bool) {
    let mut index = start;
    while index < bytes.len() {
        match bytes[index] {
            b'\\' => index += 2,
            b'\n' => return (index, false),
            byte if byte == quote => return (index, true),
            _ => index += 1,
        }
    }
    (bytes.len(), false)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
