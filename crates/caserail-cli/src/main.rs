//! caserail CLI
//!
//! Feeds test runner events into the reporter and syncs the results into
//! TestRail.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::input::InputArgs;
use commands::settings::SettingsArgs;

/// caserail - report test runner assertions to TestRail
#[derive(Parser)]
#[command(name = "caserail")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, env = "CASERAIL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect case results from runner events and submit them to a TestRail run
    Sync {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Print the results that would be submitted without contacting TestRail
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration without contacting TestRail
    Validate {
        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Print the case results found in runner events
    Scan {
        #[command(flatten)]
        input: InputArgs,

        /// Letter prefix of case identifiers
        #[arg(long, default_value = "C")]
        case_prefix: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Sync {
            input,
            settings,
            dry_run,
        } => {
            let config = settings.resolve(cli.config.as_deref())?;
            commands::sync::run(config, &input, dry_run).await?;
        }
        Commands::Validate { settings } => {
            commands::validate::run(&settings, cli.config.as_deref()).await?;
        }
        Commands::Scan { input, case_prefix } => {
            commands::scan::run(&input, &case_prefix).await?;
        }
    }

    Ok(())
}
