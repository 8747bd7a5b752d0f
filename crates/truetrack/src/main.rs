//! TrueTrack launcher
//!
//! Every subcommand runs on one Tokio runtime. Logs go to
//! `$TRUETRACK_HOME/logs`; with `--json`, stdout carries only the JSON
//! document.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, warn};
use truetrack_audit::AuditWriter;
use truetrack_logging::{init_logging, LogConfig};

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "truetrack",
    version,
    about = "Scan product codes and verify their authenticity"
)]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Append scan session events to an NDJSON audit trail
    #[arg(long, global = true, value_name = "PATH")]
    audit: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive terminal UI
    Tui(cli::tui::TuiArgs),

    /// Run one scan session and verify the decoded code
    Scan(cli::scan::ScanArgs),

    /// Verify a code without scanning
    Verify(cli::verify::VerifyArgs),

    /// Print a dashboard
    Dashboard(cli::dashboard::DashboardArgs),

    /// Show the supply chain journey of a product
    Journey(cli::journey::JourneyArgs),

    /// Show resolved paths and settings
    Config(cli::config::ConfigArgs),
}

impl Commands {
    fn wants_json(&self) -> bool {
        match self {
            Commands::Tui(_) => false,
            Commands::Scan(args) => args.json,
            Commands::Verify(args) => args.json,
            Commands::Dashboard(args) => args.json,
            Commands::Journey(args) => args.json,
            Commands::Config(args) => args.json,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Commands::Tui(_) => "tui",
            Commands::Scan(_) => "scan",
            Commands::Verify(_) => "verify",
            Commands::Dashboard(_) => "dashboard",
            Commands::Journey(_) => "journey",
            Commands::Config(_) => "config",
        }
    }
}

async fn run_command(command: Commands, audit: Option<Arc<AuditWriter>>) -> Result<()> {
    match command {
        Commands::Tui(args) => cli::tui::run(args, audit).await,
        Commands::Scan(args) => cli::scan::run(args, audit).await,
        Commands::Verify(args) => cli::verify::run(args, audit),
        Commands::Dashboard(args) => cli::dashboard::run(args),
        Commands::Journey(args) => cli::journey::run(args),
        Commands::Config(args) => cli::config::run(args),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The TUI owns the terminal; keep stderr quiet while it runs.
    let tui_mode = matches!(cli.command, Commands::Tui(_));
    let json_mode = cli.command.wants_json();
    if let Err(err) = init_logging(LogConfig {
        app_name: "truetrack",
        verbose: cli.verbose,
        tui_mode,
    }) {
        eprintln!("Warning: failed to initialise logging: {:#}", err);
    }

    let audit = match cli.audit.as_deref().map(AuditWriter::open) {
        None => None,
        Some(Ok(writer)) => Some(Arc::new(writer)),
        Some(Err(err)) => {
            eprintln!("Warning: failed to open audit trail: {}", err);
            None
        }
    };

    let command_name = cli.command.name();
    let result = run_command(cli.command, audit.clone()).await;

    if let Some(writer) = &audit {
        if let Err(err) = writer.close() {
            warn!(error = %err, "failed to close audit trail");
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(command = command_name, error = %err, "command failed");
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
