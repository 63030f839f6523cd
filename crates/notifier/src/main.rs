//! IYUU relay binary.
//!
//! Reads newline-delimited JSON notification events from stdin, e.g.
//! `{"type": "Download", "title": "Done", "text": "..."}`, and relays them.
//! End of input drains the queue before exiting; Ctrl+C stops at once.

use tokio::io::{AsyncBufReadExt, BufReader};

use relay_common::config::RelayConfig;
use relay_common::types::Message;
use relay_notifier::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_notifier=info,relay_common=info".into()),
        )
        .json()
        .init();

    tracing::info!("IYUU relay starting...");

    // Load configuration
    let config = RelayConfig::from_env()?;
    let dispatcher = Dispatcher::initialize(config)?;

    if !dispatcher.is_active() {
        tracing::warn!("Relay inactive, set RELAY_ENABLED=true and IYUU_TOKENS to deliver messages");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let input_closed = loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => match serde_json::from_str::<Message>(&line) {
                        Ok(message) => {
                            dispatcher.enqueue(message);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Ignoring malformed event");
                        }
                    },
                    None => break true,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal, stopping gracefully...");
                break false;
            }
        }
    };

    if input_closed {
        tracing::info!(pending = dispatcher.pending(), "Input closed, draining queue...");
        dispatcher.drain().await;
    } else {
        dispatcher.join().await;
    }

    tracing::info!("IYUU relay stopped.");
    Ok(())
}
