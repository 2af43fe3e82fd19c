//! Handoff - command line front-end
//!
//! Runs either side of an inter-app handoff from a terminal: the worker side
//! (`receive`), the orchestrator side (`launch`), and decoding of returned
//! handoff links (`inspect`).

mod cli;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cli::config::ConfigAction;
use handoff_core::{error::Result, HandoffConfig};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "handoff")]
#[command(about = "Inter-app workflow handoff over custom URL schemes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Config file (TOML); HANDOFF_* environment variables override it
    #[arg(short, long, env = "HANDOFF_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle an inbound link as the worker app, optionally finishing the workflow
    Receive {
        /// The link as delivered by the OS
        uri: String,

        /// Finish the workflow right away with this outcome
        #[arg(long, value_enum)]
        complete: Option<cli::receive::CompleteAs>,

        /// Message sent back with the outcome
        #[arg(short, long)]
        message: Option<String>,

        /// Extra key=value returned to the caller (repeatable)
        #[arg(short, long = "data", value_parser = cli::helpers::parse_key_value)]
        data: Vec<(String, String)>,

        /// Print the handoff URL instead of opening it
        #[arg(long)]
        dry_run: bool,
    },

    /// Open a worker app as the orchestrator
    Launch {
        /// Worker's scheme://host
        target: String,

        #[arg(long)]
        user_id: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        event: Option<String>,

        /// Correlation id (random if omitted)
        #[arg(long)]
        request_id: Option<String>,

        /// Where the worker should hand back to
        #[arg(long)]
        return_url: Option<String>,

        /// Custom key=value passed through to the worker (repeatable)
        #[arg(short, long = "field", value_parser = cli::helpers::parse_key_value)]
        fields: Vec<(String, String)>,

        /// Print the launch URL instead of opening it
        #[arg(long)]
        dry_run: bool,
    },

    /// Decode a handoff-complete link and print it as JSON
    Inspect {
        /// The returned link
        uri: String,

        /// Scheme the orchestrator listens on
        #[arg(long, default_value = "reactnativeapp")]
        scheme: String,

        /// Host the orchestrator listens on
        #[arg(long, default_value = "handoff-complete")]
        host: String,

        /// Warn unless the response echoes this request id
        #[arg(long)]
        expect_request_id: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "handoff={level},handoff_core={level}",
            level = level.as_str().to_lowercase()
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries command output
        .init();

    debug!("Handoff v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = HandoffConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config".to_string(),
    })?;

    match cli.command {
        Commands::Receive {
            uri,
            complete,
            message,
            data,
            dry_run,
        } => {
            cli::receive::handle(
                &config,
                cli::receive::ReceiveArgs {
                    uri,
                    complete,
                    message,
                    data,
                    dry_run,
                },
            )
            .await
        }
        Commands::Launch {
            target,
            user_id,
            location,
            event,
            request_id,
            return_url,
            fields,
            dry_run,
        } => {
            cli::launch::handle(
                &config,
                cli::launch::LaunchArgs {
                    target,
                    user_id,
                    location,
                    event,
                    request_id,
                    return_url,
                    fields,
                    dry_run,
                },
            )
            .await
        }
        Commands::Inspect {
            uri,
            scheme,
            host,
            expect_request_id,
        } => cli::inspect::handle(&uri, &scheme, &host, expect_request_id.as_deref()).await,
        Commands::Config { action } => cli::config::handle(&config, action),
    }
}
