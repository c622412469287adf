//! Browser-facing relay listener.
//!
//! Binds the WebSocket listen address and accepts indefinitely. Every
//! accepted connection becomes a [`ConnectionPair`] on its own task with
//! isolated failure handling: one pair's error never affects another pair
//! and never terminates the relay process.
//!
//! # Connection Flow
//!
//! 1. `Relay::bind` - bind the browser-facing listener
//! 2. Browser connects, WebSocket upgrade
//! 3. Pair dials the backend chat server
//! 4. `connected` notice, then bytes relayed verbatim both ways
//! 5. Either side closes → the other side is closed, pair ends

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::error::Result;

use super::options::RelayOptions;
use super::pair::ConnectionPair;

// ============================================================================
// Relay
// ============================================================================

/// The relay process: a bound listener plus the fixed backend target.
///
/// Holds no cross-connection mutable state; every accepted connection is
/// handled by an independent [`ConnectionPair`] task.
pub struct Relay {
    /// Browser-facing listener.
    listener: TcpListener,
    /// Resolved listen address (exact port even when bound to port 0).
    local_addr: SocketAddr,
    /// Backend chat server address, shared read-only by all pairs.
    backend_addr: SocketAddr,
}

impl Relay {
    /// Binds the browser-facing listener.
    ///
    /// Use listen port 0 to let the OS assign a free port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding fails.
    pub async fn bind(options: RelayOptions) -> Result<Self> {
        let listener = TcpListener::bind(options.listen_addr).await?;
        let local_addr = listener.local_addr()?;

        debug!(addr = %local_addr, "relay listener bound");

        Ok(Self {
            listener,
            local_addr,
            backend_addr: options.backend_addr,
        })
    }

    /// Returns the resolved listen address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the listen port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the WebSocket URL browsers connect to.
    ///
    /// Format: `ws://{addr}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    /// Accepts browser connections until the process ends.
    ///
    /// Each connection is paired with a fresh backend connection on its
    /// own task. Accept errors and pair failures are logged and do not
    /// stop the loop.
    ///
    /// # Errors
    ///
    /// Never returns `Ok`; the `Result` exists so callers can `?` the
    /// future in a `main` that also binds.
    pub async fn run(self) -> Result<()> {
        info!(addr = %self.local_addr, backend = %self.backend_addr, "relay accepting connections");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let pair = ConnectionPair::new(peer, self.backend_addr);
                    tokio::spawn(async move {
                        if let Err(e) = pair.run(stream).await {
                            warn!(peer = %peer, error = %e, "pair failed");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
