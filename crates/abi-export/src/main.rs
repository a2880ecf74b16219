// crates/abi-export/src/main.rs
// ============================================================================
// Module: ABI Export CLI
// Description: Command-line entry point for staging and publishing packages.
// Purpose: Wire configuration, the package descriptor, and the assembler.
// Dependencies: abi-export, abi-export-config, clap, tracing-subscriber
// ============================================================================

//! ## Overview
//! `abi-export publish` runs the full pipeline. `abi-export stage` stops after
//! the export directory is populated, which is useful for inspecting output
//! before anything reaches a registry. Logs go to stderr; the log level is
//! taken from `RUST_LOG` and defaults to `info`.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use abi_export::AssemblyRequest;
use abi_export::CommandRunner;
use abi_export::ExportError;
use abi_export::PackageAssembler;
use abi_export::PackageDescriptor;
use abi_export::PublishOutcome;
use abi_export::SystemCommandRunner;
use abi_export_config::ExportConfig;
use abi_export_config::PublishMode;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Packages contract interfaces and their ABIs for publication.
#[derive(Debug, Parser)]
#[command(name = "abi-export", version, about)]
struct Cli {
    /// Path to the exporter configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Stage the export directory, install, generate bindings, and publish.
    Publish(PublishArgs),
    /// Stage the export directory only; no external commands are run.
    Stage(PackageArgs),
}

/// Arguments shared by every command.
#[derive(Debug, Args)]
struct PackageArgs {
    /// Package descriptor (JSON manifest) to publish.
    #[arg(long, value_name = "FILE")]
    package: PathBuf,
    /// Export directory; reset at the start of every run.
    #[arg(long, value_name = "DIR", default_value = "export")]
    export_dir: PathBuf,
    /// Build output directory holding compiled ABI artifacts.
    #[arg(long, value_name = "DIR", default_value = "out")]
    out_dir: PathBuf,
}

/// Arguments for `publish`.
#[derive(Debug, Args)]
struct PublishArgs {
    /// Shared package arguments.
    #[command(flatten)]
    package: PackageArgs,
    /// Binding generation mode; overrides the configured mode.
    #[arg(long, value_name = "MODE", value_parser = parse_mode)]
    mode: Option<PublishMode>,
}

/// Parses a publish mode argument.
fn parse_mode(value: &str) -> Result<PublishMode, String> {
    PublishMode::from_str(value).map_err(|err| err.to_string())
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Parses arguments, runs the selected command, and maps the result to an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    exit_code(run(cli))
}

/// Loads configuration and executes the selected command against the system.
fn run(cli: Cli) -> Result<ExitCode, ExportError> {
    let config = ExportConfig::load(cli.config.as_deref())?;
    execute(cli.command, config, SystemCommandRunner)
}

/// Executes a command with an explicit configuration and command runner.
fn execute<R: CommandRunner>(
    command: Commands,
    config: ExportConfig,
    runner: R,
) -> Result<ExitCode, ExportError> {
    match command {
        Commands::Publish(args) => {
            let mode = args.mode.unwrap_or(config.publish.mode);
            let request = build_request(&args.package, mode)?;
            let assembler = PackageAssembler::new(config, runner);
            let report = assembler.run(&request)?;
            if report.outcome == PublishOutcome::Published {
                info!(
                    package = %request.descriptor.name,
                    interfaces = report.staged.interface_count(),
                    "publish complete"
                );
            }
            Ok(publish_exit_code(&report.outcome))
        }
        Commands::Stage(args) => {
            let mode = config.publish.mode;
            let request = build_request(&args, mode)?;
            let assembler = PackageAssembler::new(config, runner);
            let report = assembler.stage(&request)?;
            info!(
                export_dir = %report.export_dir.display(),
                interfaces = report.interface_count(),
                "export directory staged"
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Maps a publish outcome to the process exit code.
fn publish_exit_code(outcome: &PublishOutcome) -> ExitCode {
    match outcome {
        PublishOutcome::Published => ExitCode::SUCCESS,
        PublishOutcome::Failed {
            ..
        } => ExitCode::FAILURE,
    }
}

/// Maps a command result to the process exit code, reporting errors.
fn exit_code(result: Result<ExitCode, ExportError>) -> ExitCode {
    match result {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Loads the descriptor and assembles a request.
fn build_request(args: &PackageArgs, mode: PublishMode) -> Result<AssemblyRequest, ExportError> {
    let descriptor = PackageDescriptor::load(&args.package)?;
    Ok(AssemblyRequest {
        export_dir: args.export_dir.clone(),
        build_out_dir: args.out_dir.clone(),
        descriptor,
        mode,
    })
}

/// Initializes stderr logging filtered by `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Writes a fatal error to stderr.
fn report_error(err: &ExportError) {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "abi-export: {err}");
}
