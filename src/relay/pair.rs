//! Connection pair: one browser WebSocket, one backend TCP connection.
//!
//! A pair is created per accepted browser connection and lives until
//! either side closes or errors. Closing one side closes the other. Pairs
//! share no state; a failure in one never touches another.
//!
//! # Relaying Contract
//!
//! Backend bytes are forwarded as one WebSocket text frame per read, with
//! no re-chunking, merging, or splitting on message boundaries. The backend
//! protocol is line-oriented text; whether a line arrives whole in one
//! frame is the backend's framing contract, not something the relay
//! enforces. Browser frames are written to the backend verbatim.
//!
//! There is no application-level backpressure: flow control is delegated
//! to TCP and the WebSocket transport. A persistently slow consumer on one
//! side can grow unsent buffers without bound.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::ControlNotice;

// ============================================================================
// Constants
// ============================================================================

/// Size of the backend read buffer. Each read is forwarded as one frame.
const READ_BUFFER_SIZE: usize = 4096;

/// Monotonic pair id source, for log correlation only.
static NEXT_PAIR_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Types
// ============================================================================

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// Why the relay loop ended. Decides which terminal notice (if any) the
/// browser side still receives.
enum LoopEnd {
    /// Backend closed the connection (EOF).
    BackendClosed,
    /// Backend read or write failed.
    BackendError(String),
    /// Browser closed or errored; nobody left to notify.
    BrowserGone,
}

// ============================================================================
// ConnectionPair
// ============================================================================

/// Couples one browser-facing WebSocket with one dedicated backend
/// connection for the duration of their shared lifecycle.
pub(crate) struct ConnectionPair {
    /// Pair id for log correlation.
    id: u64,
    /// Browser-side peer address.
    peer: SocketAddr,
    /// Backend chat server address.
    backend_addr: SocketAddr,
}

impl ConnectionPair {
    /// Creates a pair handler for an accepted browser connection.
    pub(crate) fn new(peer: SocketAddr, backend_addr: SocketAddr) -> Self {
        Self {
            id: NEXT_PAIR_ID.fetch_add(1, Ordering::Relaxed),
            peer,
            backend_addr,
        }
    }

    /// Runs the pair to completion: WebSocket upgrade, backend dial, then
    /// bidirectional relaying until either side ends.
    ///
    /// Consumes the pair; teardown closes both sides exactly once no
    /// matter which side ended first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the WebSocket upgrade fails. A
    /// failed backend dial is not an error from the caller's view: the
    /// browser gets exactly one `error` notice and the pair ends cleanly.
    pub(crate) async fn run(self, stream: TcpStream) -> Result<()> {
        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        debug!(pair = self.id, peer = %self.peer, "browser connected");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();

        // Dial the backend immediately. No internal retry: end-to-end
        // retry is the browser-side connection manager's job.
        let backend = match TcpStream::connect(self.backend_addr).await {
            Ok(tcp) => tcp,
            Err(e) => {
                warn!(pair = self.id, backend = %self.backend_addr, error = %e, "backend dial failed");
                send_notice(
                    &mut ws_tx,
                    &ControlNotice::error(format!("Connection error: {e}")),
                )
                .await;
                let _ = ws_tx.close().await;
                return Ok(());
            }
        };

        debug!(pair = self.id, backend = %self.backend_addr, "backend connected");
        send_notice(&mut ws_tx, &ControlNotice::connected("Connected to chat server")).await;

        let (tcp_rx, tcp_tx) = backend.into_split();
        let ended = self.relay_loop(&mut ws_tx, &mut ws_rx, tcp_rx, tcp_tx).await;

        // Exactly one terminal notice per pair, and only while the browser
        // side is still there to hear it.
        match ended {
            LoopEnd::BackendClosed => {
                debug!(pair = self.id, "backend closed");
                send_notice(
                    &mut ws_tx,
                    &ControlNotice::disconnected("Connection to server lost"),
                )
                .await;
            }
            LoopEnd::BackendError(message) => {
                warn!(pair = self.id, error = %message, "backend error");
                send_notice(
                    &mut ws_tx,
                    &ControlNotice::error(format!("Connection error: {message}")),
                )
                .await;
            }
            LoopEnd::BrowserGone => {
                debug!(pair = self.id, "browser disconnected");
            }
        }

        // Idempotent teardown: the write halves are closed here; the read
        // halves are dropped with the pair. Closing an already-closed side
        // is a no-op we ignore.
        let _ = ws_tx.close().await;

        debug!(pair = self.id, "pair torn down");
        Ok(())
    }

    /// Forwards bytes in both directions until one side ends.
    async fn relay_loop(
        &self,
        ws_tx: &mut WsSink,
        ws_rx: &mut WsSource,
        mut tcp_rx: OwnedReadHalf,
        mut tcp_tx: OwnedWriteHalf,
    ) -> LoopEnd {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            tokio::select! {
                // Browser → backend: verbatim write.
                message = ws_rx.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = tcp_tx.write_all(text.as_bytes()).await {
                            return LoopEnd::BackendError(e.to_string());
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        if let Err(e) = tcp_tx.write_all(&bytes).await {
                            return LoopEnd::BackendError(e.to_string());
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = tcp_tx.shutdown().await;
                        return LoopEnd::BrowserGone;
                    }
                    Some(Err(e)) => {
                        debug!(pair = self.id, error = %e, "browser websocket error");
                        let _ = tcp_tx.shutdown().await;
                        return LoopEnd::BrowserGone;
                    }
                    // Ping/Pong handled by tungstenite.
                    Some(Ok(_)) => {}
                },

                // Backend → browser: one frame per read.
                read = tcp_rx.read(&mut buf) => match read {
                    Ok(0) => return LoopEnd::BackendClosed,
                    Ok(n) => {
                        let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            return LoopEnd::BrowserGone;
                        }
                    }
                    Err(e) => return LoopEnd::BackendError(e.to_string()),
                },
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Sends a control notice, logging instead of failing: by the time a
/// notice cannot be delivered the browser side is already gone.
async fn send_notice(ws_tx: &mut WsSink, notice: &ControlNotice) {
    match notice.encode() {
        Ok(json) => {
            if let Err(e) = ws_tx.send(Message::Text(json.into())).await {
                debug!(error = %e, "control notice not delivered");
            }
        }
        Err(e) => warn!(error = %e, "control notice serialization failed"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_ids_are_unique() {
        let backend = "127.0.0.1:5555".parse().unwrap();
        let peer = "127.0.0.1:50000".parse().unwrap();

        let a = ConnectionPair::new(peer, backend);
        let b = ConnectionPair::new(peer, backend);
        assert_ne!(a.id, b.id);
    }
}
