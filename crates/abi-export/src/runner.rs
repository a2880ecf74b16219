// crates/abi-export/src/runner.rs
// ============================================================================
// Module: Command Runner
// Description: Injected capability for running external tools.
// Purpose: Isolate process spawning so the assembler can be driven by fakes.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The assembler never spawns processes directly. It describes each external
//! step as a [`CommandSpec`] and hands it to a [`CommandRunner`]. Production
//! code uses [`SystemCommandRunner`]; tests substitute a recording fake.
//!
//! Commands are executed without a shell. Invocations block until the child
//! exits; there is no timeout.

use std::fmt;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

// ============================================================================
// CONSTANTS: Captured output limits
// ============================================================================

/// Maximum number of trailing stderr bytes kept from a captured command.
pub const MAX_CAPTURED_STDERR_BYTES: usize = 4 * 1024;

/// How a command's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Output is captured; stderr is kept for diagnostics.
    Captured,
    /// Streams are inherited from the current process (interactive).
    Inherited,
}

/// Description of one external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute.
    pub program: String,
    /// Program arguments.
    pub args: Vec<String>,
    /// Working directory for the child process.
    pub working_dir: PathBuf,
    /// Standard stream wiring.
    pub stdio: StdioMode,
}

impl CommandSpec {
    /// Builds a command from a configured `[program, args...]` vector.
    ///
    /// Returns `None` when the vector is empty.
    #[must_use]
    pub fn from_parts(parts: &[String], working_dir: &Path, stdio: StdioMode) -> Option<Self> {
        let (program, args) = parts.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            working_dir: working_dir.to_path_buf(),
            stdio,
        })
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) || arg.is_empty() {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Outcome of a completed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStatus {
    /// Exit code, or `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Trailing captured stderr (empty for inherited streams).
    pub stderr: String,
}

impl CommandStatus {
    /// A successful exit with no captured output.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            code: Some(0),
            stderr: String::new(),
        }
    }

    /// A failed exit with the given code.
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
        }
    }

    /// Returns true when the command exited with status zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Describes a failed status for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        let status = self
            .code
            .map_or_else(|| "terminated by signal".to_string(), |code| format!("exit status {code}"));
        let stderr = self.stderr.trim();
        if stderr.is_empty() { status } else { format!("{status}: {stderr}") }
    }
}

/// Runs external commands on behalf of the assembler.
pub trait CommandRunner {
    /// Runs `command` to completion.
    ///
    /// # Errors
    /// Returns an IO error when the process cannot be spawned or awaited. A
    /// non-zero exit is reported through [`CommandStatus`], not as an error.
    fn run(&self, command: &CommandSpec) -> io::Result<CommandStatus>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &CommandSpec) -> io::Result<CommandStatus> {
        (**self).run(command)
    }
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command: &CommandSpec) -> io::Result<CommandStatus> {
        let mut process = Command::new(&command.program);
        process.args(&command.args).current_dir(&command.working_dir);
        match command.stdio {
            StdioMode::Captured => {
                process.stdin(Stdio::null());
                let output = process.output()?;
                Ok(CommandStatus {
                    code: output.status.code(),
                    stderr: tail_utf8(&output.stderr, MAX_CAPTURED_STDERR_BYTES),
                })
            }
            StdioMode::Inherited => {
                let status = process.status()?;
                Ok(CommandStatus {
                    code: status.code(),
                    stderr: String::new(),
                })
            }
        }
    }
}

/// Returns at most `limit` trailing bytes of `bytes` as lossy UTF-8.
fn tail_utf8(bytes: &[u8], limit: usize) -> String {
    let start = bytes.len().saturating_sub(limit);
    String::from_utf8_lossy(&bytes[start ..]).into_owned()
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

    use std::path::Path;

    use super::CommandSpec;
    use super::CommandStatus;
    use super::StdioMode;
    use super::tail_utf8;

    #[test]
    fn from_parts_splits_program_and_args() -> Result<(), String> {
        let parts = vec!["yarn".to_string(), "publish".to_string(), "--access".to_string()];
        let spec = CommandSpec::from_parts(&parts, Path::new("export"), StdioMode::Inherited)
            .ok_or("expected a command")?;
        assert_eq!(spec.program, "yarn");
        assert_eq!(spec.args, vec!["publish", "--access"]);
        assert_eq!(spec.to_string(), "yarn publish --access");
        assert!(CommandSpec::from_parts(&[], Path::new("."), StdioMode::Captured).is_none());
        Ok(())
    }

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let spec = CommandSpec {
            program: "yarn".to_string(),
            args: vec!["a b".to_string(), String::new()],
            working_dir: Path::new(".").to_path_buf(),
            stdio: StdioMode::Captured,
        };
        assert_eq!(spec.to_string(), "yarn 'a b' ''");
    }

    #[test]
    fn status_description_includes_stderr() {
        assert!(CommandStatus::success().is_success());
        let failed = CommandStatus::failure(2, "  boom\n");
        assert!(!failed.is_success());
        assert_eq!(failed.describe(), "exit status 2: boom");
        let signalled = CommandStatus {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(signalled.describe(), "terminated by signal");
    }

    #[test]
    fn tail_keeps_trailing_bytes() {
        assert_eq!(tail_utf8(b"abcdef", 3), "def");
        assert_eq!(tail_utf8(b"ab", 8), "ab");
    }
}
