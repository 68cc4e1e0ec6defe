//! HenryBot CLI, the main entry point.
//!
//! Commands:
//! - `init`    write a default config file
//! - `run`     start the Discord bot
//! - `ask`     ask one question through the agent
//! - `search`  query the knowledge store directly

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "henrybot",
    about = "HenryBot: a Discord music assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of ~/.henrybot/config.toml
    #[arg(short, long, global = true, env = "HENRYBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Start the Discord bot
    Run,

    /// Ask a single question and print the answer with its tool steps
    Ask {
        #[arg(short, long)]
        message: String,
    },

    /// Search the knowledge store
    Search {
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let config_path = cli
        .config
        .unwrap_or_else(|| henrybot_config::AppConfig::config_dir().join("config.toml"));

    match cli.command {
        Commands::Init { force } => commands::init::run(&config_path, force)?,
        Commands::Run => commands::run::run(&config_path).await?,
        Commands::Ask { message } => commands::ask::run(&config_path, &message).await?,
        Commands::Search { query } => commands::search::run(&config_path, &query).await?,
    }

    Ok(())
}
