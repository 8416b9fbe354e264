//! termagent CLI: the main entry point.
//!
//! Commands:
//! - `agent`    Interactive chat or single-message mode (the default)
//! - `onboard`  Write a default config file

use clap::{Parser, Subcommand};

mod commands;
mod render;

#[derive(Parser)]
#[command(
    name = "termagent",
    about = "termagent: a terminal agent that thinks, runs tools, and answers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

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
    },

    /// Write a default configuration file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with answers on stdout.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Agent { message: None }) {
        Commands::Agent { message } => commands::agent::run(message).await?,
        Commands::Onboard => commands::onboard::run()?,
    }

    Ok(())
}
