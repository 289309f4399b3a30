//! Converse terminal client - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Install the tracing subscriber
//! 3. Spawn playback into a terminal view
//! 4. Start the chat session (session bootstrap + greeting)
//! 5. Loop over stdin lines, client action completions and Ctrl-C

mod cli;
mod view;

use std::sync::Arc;

use clap::Parser;
use converse_chat::{ChatError, ChatSession, HttpMessageClient, PlaybackScheduler};
use converse_core::ConverseConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

use cli::CliArgs;
use view::TerminalView;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ConverseConfig::load_or_default(&config_file);
    args.apply_overrides(&mut config);

    // Tracing. Logs go to stderr so they stay out of the transcript.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Converse v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_file.display(),
        url = %config.assistant.base_url,
        "Configuration loaded"
    );

    // Playback.
    let terminal = TerminalView::stdout(config.search.clone());
    let shown_options = terminal.shown_options();
    let playback = PlaybackScheduler::spawn(terminal, config.playback.clone());

    // Session.
    let transport = Arc::new(HttpMessageClient::from_config(&config.assistant)?);
    let mut chat = ChatSession::new(transport, playback, &config);

    match chat.start().await {
        Ok(status) => tracing::debug!(%status, "Session started"),
        Err(e @ ChatError::SessionUnavailable(_)) => {
            tracing::error!(error = %e, "Cannot start a conversation");
            return Err(e.into());
        }
        Err(e) => tracing::warn!(error = %e, "Greeting turn failed"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("Input closed");
                    break;
                };
                match chat.submit(shown_options.resolve(&line)).await {
                    Ok(_) | Err(ChatError::EmptyMessage) => {}
                    Err(e) if e.is_turn_failure() => {
                        tracing::error!(error = %e, status = %chat.status(), "Unhandled turn failure");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Some(completion) = chat.next_action_completion() => {
                if let Err(e) = chat.apply_action_completion(completion).await {
                    tracing::error!(error = %e, "Client action follow-up failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                return Ok(());
            }
        }
    }

    // Let the last turn finish playing before exit.
    chat.playback().wait_idle().await?;
    Ok(())
}
