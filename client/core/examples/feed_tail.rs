//! Tail a live feed subscription from the terminal.
//!
//! ```bash
//! # Tail the feed for user 0 against a local gateway
//! cargo run --example feed_tail -- 0
//!
//! # With verbose logging
//! RUST_LOG=debug cargo run --example feed_tail -- 0
//! ```
//!
//! Configuration comes from `~/.config/newswire/client.toml` and
//! `NEWSWIRE_*` environment variables; see `newswire_core::config`.

use std::sync::Arc;
use std::time::Duration;

use newswire_core::{ClientConfig, StreamConsumer, WebSocketConnector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let uid = std::env::args().nth(1).unwrap_or_else(|| "0".to_string());
    let config = ClientConfig::load();
    println!("tailing feed/{uid} via {}", config.ws_base);

    let mut consumer = StreamConsumer::new(config, Arc::new(WebSocketConnector));
    consumer.set_feed(&uid)?;

    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let mut shown = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                consumer.poll();
                // A tail wants everything as it arrives, so commit eagerly.
                consumer.refresh();
                for message in &consumer.log()[shown..] {
                    println!(
                        "[{}] {}",
                        message.topic.as_deref().unwrap_or("-"),
                        message.title
                    );
                }
                shown = consumer.log().len();
            }
        }
    }

    consumer.shutdown();
    Ok(())
}
