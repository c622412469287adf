//! Chat bridge - WebSocket ⇄ TCP transport for a terminal-styled chat UI.
//!
//! Browsers cannot open raw TCP sockets, so a relay process bridges each
//! browser-facing WebSocket to a dedicated connection on the line-oriented
//! TCP chat server. This crate is that transport layer, both ends of it:
//!
//! - **Relay**: accepts browser connections, pairs each with a fresh
//!   backend connection, and forwards bytes verbatim in both directions
//!   until either side closes.
//! - **Connection manager**: the client side; owns one logical relay
//!   connection, publishes inbound frames and state changes to
//!   subscribers, and reconnects with bounded linear backoff.
//!
//! ```text
//! UI text → ConnectionManager::send → frame → Relay → raw write → backend
//! backend → raw read → Relay → frame → ConnectionManager → subscribers → UI
//! ```
//!
//! Chat semantics (`/login`, `/msg`, user lists, rendering) live entirely
//! outside this crate; both ends treat payloads as opaque text lines.
//!
//! # Quick Start
//!
//! ```no_run
//! use chat_bridge::{ConnectionManager, ManagerOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = ConnectionManager::new(
//!         ManagerOptions::new().with_url("ws://127.0.0.1:8080"),
//!     );
//!
//!     let _messages = manager.on_message(|frame| println!("{frame:?}"));
//!     let _states = manager.on_connection_change(|state| println!("{state:?}"));
//!
//!     manager.connect();
//!     manager.send("/login alice secret\n").await?;
//!     Ok(())
//! }
//! ```
//!
//! The relay runs as its own process; see the `chat-relay` binary.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`manager`] | Client-side connection manager |
//! | [`protocol`] | Frame envelope shared by both ends |
//! | [`relay`] | WebSocket ⇄ TCP relay process |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Client-side connection manager.
///
/// One instance per browser session, owned by the composition root.
pub mod manager;

/// Wire protocol: control notices and raw data frames.
pub mod protocol;

/// WebSocket ⇄ TCP relay.
pub mod relay;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Manager types
pub use manager::{
    ConnectionManager, DisconnectReason, ManagerOptions, ReconnectPolicy, RuntimeContext,
    SubscriptionToken, TransportState,
};

// Protocol types
pub use protocol::{ControlKind, ControlNotice, Frame};

// Relay types
pub use relay::{Relay, RelayOptions};
