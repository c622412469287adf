//! Relay configuration options.
//!
//! Controls the browser-facing listen address and the fixed backend
//! target. The backend address is configured at startup only and is never
//! exposed to browsers.
//!
//! # Example
//!
//! ```ignore
//! use chat_bridge::RelayOptions;
//!
//! let options = RelayOptions::new()
//!     .with_listen_addr("0.0.0.0:9000".parse()?)
//!     .with_backend_addr("10.0.0.5:5555".parse()?);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default browser-facing listen port.
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

/// Default backend chat server port.
pub const DEFAULT_BACKEND_PORT: u16 = 5555;

/// Environment variable overriding the listen address.
pub const ENV_LISTEN_ADDR: &str = "CHAT_RELAY_LISTEN_ADDR";

/// Environment variable overriding the backend address.
pub const ENV_BACKEND_ADDR: &str = "CHAT_RELAY_BACKEND_ADDR";

// ============================================================================
// RelayOptions
// ============================================================================

/// Relay process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOptions {
    /// Address the browser-facing WebSocket listener binds to.
    pub listen_addr: SocketAddr,

    /// Address of the backend chat server, one dedicated TCP connection
    /// per browser connection.
    pub backend_addr: SocketAddr,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl RelayOptions {
    /// Creates options with default addresses
    /// (`0.0.0.0:8080` → `127.0.0.1:5555`).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            listen_addr: SocketAddr::new(
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                DEFAULT_LISTEN_PORT,
            ),
            backend_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_BACKEND_PORT),
        }
    }

    /// Loads options from the environment.
    ///
    /// Falls back to the defaults when a variable is not set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a set variable cannot be parsed as a
    /// socket address.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::new();

        if let Ok(value) = std::env::var(ENV_LISTEN_ADDR) {
            options.listen_addr = parse_addr(ENV_LISTEN_ADDR, &value)?;
        }
        if let Ok(value) = std::env::var(ENV_BACKEND_ADDR) {
            options.backend_addr = parse_addr(ENV_BACKEND_ADDR, &value)?;
        }

        Ok(options)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl RelayOptions {
    /// Sets the browser-facing listen address.
    ///
    /// Port 0 lets the OS assign a free port, useful for tests.
    #[inline]
    #[must_use]
    pub const fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Sets the backend chat server address.
    #[inline]
    #[must_use]
    pub const fn with_backend_addr(mut self, addr: SocketAddr) -> Self {
        self.backend_addr = addr;
        self
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_addr(key: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|_| Error::config(format!("{key}={value} is not a valid socket address")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RelayOptions::new();
        assert_eq!(options.listen_addr.port(), DEFAULT_LISTEN_PORT);
        assert_eq!(options.backend_addr.port(), DEFAULT_BACKEND_PORT);
        assert!(options.backend_addr.ip().is_loopback());
    }

    #[test]
    fn test_builder_methods() {
        let listen = "127.0.0.1:0".parse().unwrap();
        let backend = "127.0.0.1:6000".parse().unwrap();
        let options = RelayOptions::new()
            .with_listen_addr(listen)
            .with_backend_addr(backend);

        assert_eq!(options.listen_addr, listen);
        assert_eq!(options.backend_addr, backend);
    }

    #[test]
    fn test_parse_addr_rejects_garbage() {
        let err = parse_addr(ENV_LISTEN_ADDR, "not-an-addr").unwrap_err();
        assert!(err.to_string().contains(ENV_LISTEN_ADDR));
    }
}
