//! Error types for the chat bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chat_bridge::{ConnectionManager, Result};
//!
//! async fn example(manager: &ConnectionManager) -> Result<()> {
//!     manager.send("/list").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Misconfigured`] |
//! | Connection | [`Error::Connection`], [`Error::NotConnected`], [`Error::ConnectionClosed`], [`Error::AttemptsExhausted`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when relay or manager configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Target rejected by the misconfiguration guard.
    ///
    /// Returned when a loopback target is resolved in a deployed runtime
    /// context. Retrying such a target can never succeed, so no reconnect
    /// attempt is consumed.
    #[error(
        "Misconfigured target: {target} is a loopback address unreachable from a deployed client"
    )]
    Misconfigured {
        /// The rejected target URL.
        target: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection attempt failed.
    ///
    /// Returned when a WebSocket or backend TCP connection cannot be
    /// established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// No connection is currently open.
    ///
    /// Returned by send operations while disconnected. The payload is
    /// dropped, never buffered.
    #[error("Not connected")]
    NotConnected,

    /// Connection closed unexpectedly.
    ///
    /// Returned when the transport is lost during an operation.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Automatic reconnection gave up.
    ///
    /// Returned after the attempt cap is reached. Only an external
    /// `connect` call restarts the cycle.
    #[error("Reconnect attempts exhausted after {attempts} tries")]
    AttemptsExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a misconfigured-target error.
    #[inline]
    pub fn misconfigured(target: impl Into<String>) -> Self {
        Self::Misconfigured {
            target: target.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an attempts-exhausted error.
    #[inline]
    pub fn attempts_exhausted(attempts: u32) -> Self {
        Self::AttemptsExhausted { attempts }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::NotConnected
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if retrying can never succeed without an external
    /// configuration or connect call.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Misconfigured { .. } | Self::AttemptsExhausted { .. } | Self::Config { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("bad listen address");
        assert_eq!(err.to_string(), "Configuration error: bad listen address");
    }

    #[test]
    fn test_attempts_exhausted_display() {
        let err = Error::attempts_exhausted(3);
        assert_eq!(
            err.to_string(),
            "Reconnect attempts exhausted after 3 tries"
        );
    }

    #[test]
    fn test_is_connection_error() {
        let conn_err = Error::connection("test");
        let not_connected = Error::NotConnected;
        let closed = Error::ConnectionClosed;
        let other = Error::config("test");

        assert!(conn_err.is_connection_error());
        assert!(not_connected.is_connection_error());
        assert!(closed.is_connection_error());
        assert!(!other.is_connection_error());
    }

    #[test]
    fn test_is_terminal() {
        let misconfigured = Error::misconfigured("ws://127.0.0.1:8080");
        let exhausted = Error::attempts_exhausted(10);
        let transient = Error::connection("test");

        assert!(misconfigured.is_terminal());
        assert!(exhausted.is_terminal());
        assert!(!transient.is_terminal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::ConnectionRefused, "refused");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
