//! Chamber walker command-line entry point.
//!
//! ```text
//!   config (TOML + CLI overrides)
//!        │
//!        ▼
//!   ┌─────────┐   identifier   ┌─────────┐   identifier         ┌─────────┐
//!   │chamber 0│ ─────────────▶ │chamber 1│ ─────────────▶ ... ─▶│chamber 7│ ─▶ final message
//!   └─────────┘                └─────────┘                      └─────────┘
//!        TCP                       UDP                              TCP
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use chamber_walker::config::{self, validation::validate_config, ConfigError, WalkerConfig};
use chamber_walker::observability::logging;
use chamber_walker::{Chamber, Identifier, Walker};

#[derive(Parser)]
#[command(name = "chamber-walker")]
#[command(about = "Walk the chained protocol chambers", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Username for the handshake (overrides config and $USER).
    #[arg(short, long)]
    username: Option<String>,

    /// Chamber to start from (0-7).
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=7))]
    start: u8,

    /// Identifier expected by the starting chamber. Required when --start > 0.
    #[arg(short, long)]
    identifier: Option<String>,

    /// Write the walk report as JSON to this file.
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Default log filter (RUST_LOG still takes precedence).
    #[arg(long)]
    log_filter: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("Error: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("chamber-walker v{} starting", env!("CARGO_PKG_VERSION"));

    let start = Chamber::from_index(usize::from(cli.start)).unwrap_or(Chamber::Handshake);
    let identifier = match cli.identifier.as_deref() {
        Some(raw) => match Identifier::new(raw) {
            Some(identifier) => Some(identifier),
            None => {
                tracing::error!("--identifier must not be blank");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let walker = Walker::new(config);

    let outcome = tokio::select! {
        outcome = walker.run_from(start, identifier) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, abandoning walk");
            return ExitCode::FAILURE;
        }
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(chamber = ?e.chamber(), error = %e, "Walk failed");
            return ExitCode::FAILURE;
        }
    };

    println!("{}", report.final_message);
    tracing::info!(
        chambers = report.steps.len(),
        total_ms = report.total_elapsed_ms(),
        "Walk finished"
    );

    if let Some(path) = &cli.report {
        let written = report
            .to_json_pretty()
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            tracing::error!(path = %path.display(), error = %e, "Failed to write report");
            return ExitCode::FAILURE;
        }
        tracing::info!(path = %path.display(), "Report written");
    }

    ExitCode::SUCCESS
}

/// Load the config file (or defaults) and apply command-line overrides.
fn build_config(cli: &Cli) -> Result<WalkerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => WalkerConfig::default(),
    };

    if let Some(username) = &cli.username {
        config.identity.username = Some(username.clone());
    }
    if let Some(filter) = &cli.log_filter {
        config.observability.log_filter = filter.clone();
    }

    validate_config(&config).map_err(ConfigError::Invalid)?;
    Ok(config)
}
