//! Client-side connection manager.
//!
//! Owns at most one logical relay connection, exposes inbound frames and
//! state changes as subscriptions, and reconnects automatically with
//! bounded linear backoff. A misconfiguration guard refuses to retry a
//! loopback target from a deployed context, which can never succeed.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`ConnectionManager`] and its event loop |
//! | `options` | Target URL, policy, and context configuration |
//! | `registry` | Observer registry with unsubscribe tokens |
//! | `state` | State machine, disconnect reasons, reconnect policy |

// ============================================================================
// Submodules
// ============================================================================

/// Connection manager and event loop.
pub mod core;

/// Manager configuration.
pub mod options;

/// Observer registry.
pub mod registry;

/// Transport state machine and reconnect policy.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::ConnectionManager;
pub use options::{DEFAULT_RELAY_URL, ManagerOptions};
pub use registry::{SubscriberRegistry, SubscriptionToken};
pub use state::{DisconnectReason, ReconnectPolicy, RuntimeContext, TransportState};
