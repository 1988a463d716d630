//! Binary entry point for the refgate CLI.
//!
//! Refgate is a pre-deployment gate: before promoting a metadata bundle it
//! verifies that every cross-referenced object named by an application or
//! permission set definition already exists in the target org, and reports
//! every reference that cannot be confirmed. It is read-only verification;
//! nothing in the org is modified.
//!
//! ## Usage
//!
//! ```bash
//! # Audit an application's references against the default org
//! refgate verify --kind application --name Console
//!
//! # Audit a permission set against a named org, keep the run artifacts
//! refgate verify --kind permission-set --name Sales_Admin \
//!     --target-org staging --keep-artifacts
//!
//! # List registered metadata kinds
//! refgate kinds
//! ```
//!
//! A completed run exits 0 regardless of how many references were missing;
//! non-zero exit codes are reserved for fatal errors (bad arguments,
//! missing definition file, query transport failure).

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use refgate::cli::{run_verify, VerifyRequest};
use refgate_core::error::{GateError, OutputErrorCode};
use refgate_core::output::{
    emit_response, ErrorResponse, KindInfo, KindsResponse, VerifyResponse,
};
use refgate_core::profile::{MetadataKind, TypeProfile, DEFAULT_SOURCE_DIR};
use refgate_core::transport::SfCliTransport;

// ============================================================================
// CLI Structure
// ============================================================================

/// Pre-deployment reference verification for org metadata bundles.
#[derive(Parser, Debug)]
#[command(
    name = "refgate",
    version,
    about = "Verify that declared metadata references exist in a target org"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Metadata kind selector.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    /// Custom application.
    Application,
    /// Permission set.
    PermissionSet,
}

impl KindArg {
    fn to_kind(self) -> MetadataKind {
        match self {
            KindArg::Application => MetadataKind::Application,
            KindArg::PermissionSet => MetadataKind::PermissionSet,
        }
    }
}

/// Output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text report (default).
    #[default]
    Text,
    /// JSON response envelope.
    Json,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Verify a definition document's references against the target org.
    Verify {
        /// Metadata kind of the definition document.
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Name of the application or permission set.
        #[arg(long)]
        name: String,
        /// Org alias or username to query (default: the CLI's default org).
        #[arg(long)]
        target_org: Option<String>,
        /// Source-format root holding the definition documents.
        #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
        source_dir: PathBuf,
        /// Keep the run artifacts instead of removing them at run end.
        #[arg(long)]
        keep_artifacts: bool,
        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List registered metadata kinds and their definition paths.
    Kinds {
        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Errors go to stdout as JSON, keeping the output parseable.
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();
            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), GateError> {
    match cli.command {
        Command::Verify {
            kind,
            name,
            target_org,
            source_dir,
            keep_artifacts,
            format,
        } => execute_verify(kind, name, target_org, source_dir, keep_artifacts, format),
        Command::Kinds { format } => execute_kinds(format),
    }
}

// ============================================================================
// Command Executors
// ============================================================================

/// Execute the verify command.
fn execute_verify(
    kind: KindArg,
    name: String,
    target_org: Option<String>,
    source_dir: PathBuf,
    keep_artifacts: bool,
    format: OutputFormat,
) -> Result<(), GateError> {
    let request = VerifyRequest {
        kind: kind.to_kind(),
        name,
        source_dir,
        artifact_dir: PathBuf::from("."),
        keep_artifacts,
    };
    let transport = SfCliTransport::new(target_org);
    let outcome = run_verify(&request, &transport)?;

    match format {
        OutputFormat::Text => {
            outcome
                .report
                .render_text(&mut io::stdout())
                .map_err(|e| GateError::internal(e.to_string()))?;
        }
        OutputFormat::Json => {
            let response = VerifyResponse::new(
                outcome.kind.as_str(),
                outcome.name,
                outcome.report.checked(),
                outcome.report.missing(),
            );
            emit_response(&response, &mut io::stdout())
                .map_err(|e| GateError::internal(e.to_string()))?;
        }
    }
    let _ = io::stdout().flush();
    Ok(())
}

/// Execute the kinds command.
fn execute_kinds(format: OutputFormat) -> Result<(), GateError> {
    let kinds: Vec<KindInfo> = MetadataKind::all()
        .iter()
        .map(|kind| KindInfo {
            kind: kind.as_str().to_string(),
            path: TypeProfile::for_kind(*kind).path_template(),
        })
        .collect();

    match format {
        OutputFormat::Text => {
            let mut stdout = io::stdout();
            for info in &kinds {
                writeln!(stdout, "{}\t{}", info.kind, info.path)
                    .map_err(|e| GateError::internal(e.to_string()))?;
            }
        }
        OutputFormat::Json => {
            emit_response(&KindsResponse::new(kinds), &mut io::stdout())
                .map_err(|e| GateError::internal(e.to_string()))?;
        }
    }
    let _ = io::stdout().flush();
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
