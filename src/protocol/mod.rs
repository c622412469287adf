//! Wire protocol between browser clients and the relay.
//!
//! Two kinds of frame share the browser-facing channel:
//!
//! | Frame | Direction | Purpose |
//! |-------|-----------|---------|
//! | Control notice | Relay → Browser | Pair lifecycle status (`connected`, `disconnected`, `error`) |
//! | Raw data | Both | Opaque chat text, forwarded verbatim |
//!
//! Control notices are JSON objects of the shape
//! `{"type": "connected", "message": "..."}`. Anything that does not parse
//! as a control notice is raw data. [`Frame::decode`] is the single place
//! where that classification happens; consumers never re-implement it.
//!
//! The relay ⇄ backend side carries no envelope at all: newline-terminated
//! text, opaque to this crate.

// ============================================================================
// Submodules
// ============================================================================

/// Discriminated frame envelope and control notice types.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{ControlKind, ControlNotice, Frame};
