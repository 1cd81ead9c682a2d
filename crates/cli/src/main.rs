//! ReactLoop CLI, the main entry point.
//!
//! Commands:
//! - `agent`   Single message or interactive chat with the agent
//! - `tools`   Show the tool catalogue the agent is given
//! - `config`  Show the effective configuration or write a starter file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "reactloop",
    about = "ReactLoop: a reasoning-action agent with tools",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Agent {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Start every run from an empty history
        #[arg(long)]
        clear: bool,
    },

    /// Show the tools the agent can call
    Tools {
        /// Print the full system prompt instead of the catalogue
        #[arg(long)]
        prompt: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Agent { message, clear } => commands::agent::run(message, clear).await?,
        Commands::Tools { prompt } => commands::tools::run(prompt).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
    }

    Ok(())
}
