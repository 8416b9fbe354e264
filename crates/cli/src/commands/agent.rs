//! `termagent agent`: interactive or single-message chat mode.

use std::sync::Arc;
use termagent_agent::{AgentLoop, QueryOutcome};
use termagent_channels::{CliChannel, InputLine};
use termagent_config::AppConfig;
use termagent_core::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::render::{self, TerminalRenderer};

pub async fn run(message: Option<String>) -> Result<()> {
    let config = AppConfig::load().map_err(|e| Error::Config {
        message: e.to_string(),
    })?;

    // Nothing is sent anywhere without a key.
    if !config.has_api_key() {
        print_missing_key_help();
        return Err(Error::Config {
            message: "no API key found, see above for setup instructions".into(),
        });
    }

    let provider = termagent_providers::build_from_config(&config)?;
    let mut agent =
        AgentLoop::from_config(&config, provider)?.with_sink(Arc::new(TerminalRenderer));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received");
            interrupt.cancel();
        }
    });

    if let Some(msg) = message {
        // Single message mode
        let outcome = agent.process(&msg, &cancel).await;
        return match outcome {
            QueryOutcome::Terminated { .. } => Ok(()),
            QueryOutcome::Aborted { reason, .. } => Err(Error::Aborted(reason.to_string())),
        };
    }

    render::banner(&config.models);
    let mut channel = CliChannel::stdin();

    loop {
        render::prompt();
        let input = tokio::select! {
            _ = cancel.cancelled() => break,
            input = channel.next_input() => input.map_err(|e| Error::Input(e.to_string()))?,
        };

        match input {
            InputLine::Exit => {
                render::goodbye();
                return Ok(());
            }
            InputLine::Empty => render::empty_query(),
            InputLine::Query(query) => {
                agent.process(&query, &cancel).await;
                if cancel.is_cancelled() {
                    break;
                }
                println!();
            }
        }
    }

    // Interrupted: a user-requested quit, so the status is success. A pending
    // stdin read sits on a blocking thread that the runtime would wait for on
    // shutdown, so leave directly.
    println!();
    render::goodbye();
    std::process::exit(0);
}

fn print_missing_key_help() {
    let config_path = AppConfig::config_dir().join("config.toml");
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    export GEMINI_API_KEY=...      (Gemini, the default endpoint)");
    eprintln!("    export TERMAGENT_API_KEY=...   (any OpenAI-compatible endpoint)");
    eprintln!("    export OPENAI_API_KEY=...");
    eprintln!();
    eprintln!("  Or run `termagent onboard` and add it to:");
    eprintln!("    {}", config_path.display());
    eprintln!();
}
