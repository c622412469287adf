//! chat-relay entry point.
//!
//! Bridges browser-facing WebSocket connections to the TCP chat server.
//! Configuration comes from the environment:
//!
//! - `CHAT_RELAY_LISTEN_ADDR` - browser-facing bind address (default `0.0.0.0:8080`)
//! - `CHAT_RELAY_BACKEND_ADDR` - chat server address (default `127.0.0.1:5555`)
//! - `RUST_LOG` - log filter (default `info`)

use tracing_subscriber::EnvFilter;

use chat_bridge::relay::{Relay, RelayOptions};
use chat_bridge::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = RelayOptions::from_env()?;
    let relay = Relay::bind(options.clone()).await?;

    tracing::info!(addr = %relay.local_addr(), "WebSocket relay listening");
    tracing::info!(backend = %options.backend_addr, "forwarding connections to chat server");

    relay.run().await
}
