//! WebSocket ⇄ TCP relay.
//!
//! Browsers cannot open raw TCP sockets, so the relay bridges a
//! browser-facing WebSocket to the line-oriented TCP chat server. It never
//! interprets payload content: chat commands and messages pass through
//! verbatim.
//!
//! ```text
//! ┌─────────────┐                    ┌─────────────┐   ┌──────────────┐
//! │  Browser UI │      WebSocket     │    Relay    │   │ Chat server  │
//! │  (manager)  │◄──────────────────►│  pair task  │◄─►│  (TCP :5555) │
//! │             │   frames + notices │  per client │   │  text lines  │
//! └─────────────┘                    └─────────────┘   └──────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `options` | Listen / backend address configuration |
//! | `pair` | One browser connection paired with one backend connection |
//! | `server` | Listener and accept loop |

// ============================================================================
// Submodules
// ============================================================================

/// Relay configuration options.
pub mod options;

/// Connection pair lifecycle and relaying.
mod pair;

/// Browser-facing relay listener.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use options::RelayOptions;
pub use server::Relay;
