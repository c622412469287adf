//! Connection manager and its event loop.
//!
//! The manager owns at most one logical relay connection per instance and
//! is constructed explicitly by the application's composition root; there
//! is no process-wide singleton, so independent instances (and tests)
//! never interfere.
//!
//! # Event Loop
//!
//! A handle sends commands over a channel to a spawned task that owns the
//! WebSocket and all state transitions:
//!
//! - Inbound frames are classified and dispatched to subscribers
//! - `send` is answered over a oneshot reply channel
//! - The reconnect backoff timer runs inside the loop's `select!`, so a
//!   `disconnect` command cancels it by winning the race

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};
use url::{Host, Url};

use crate::error::{Error, Result};
use crate::protocol::{ControlNotice, Frame};

use super::options::ManagerOptions;
use super::registry::{SubscriberRegistry, SubscriptionToken};
use super::state::{DisconnectReason, TransportState};

// ============================================================================
// Types
// ============================================================================

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsClientSink = SplitSink<WsClient, Message>;

// ============================================================================
// ManagerCommand
// ============================================================================

/// Internal commands for the event loop.
enum ManagerCommand {
    /// Open a connection if none is open.
    Connect {
        /// Explicit target, overriding the configured default.
        url: Option<String>,
    },
    /// Write text if connected; never buffered.
    Send {
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Intentional shutdown; cancels any pending reconnect.
    Disconnect,
}

/// How an open connection ended.
enum SessionEnd {
    /// Remote close or transport error; reconnection may follow.
    Dropped(String),
    /// Manual disconnect; terminal until an external connect.
    Manual,
    /// All manager handles dropped; the loop exits.
    HandlesDropped,
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Client-side relay connection with automatic bounded reconnection.
///
/// Cheap to clone; all clones drive the same connection. Dropping the
/// last handle shuts the event loop down and closes the transport.
///
/// # Example
///
/// ```ignore
/// use chat_bridge::{ConnectionManager, ManagerOptions};
///
/// let manager = ConnectionManager::new(ManagerOptions::new());
/// let _token = manager.on_message(|frame| println!("{frame:?}"));
/// manager.connect();
/// ```
pub struct ConnectionManager {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ManagerCommand>,
    /// Subscriber registry (shared with the event loop).
    registry: Arc<SubscriberRegistry>,
    /// Current state (shared with the event loop).
    state: Arc<Mutex<TransportState>>,
}

impl Clone for ConnectionManager {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            registry: Arc::clone(&self.registry),
            state: Arc::clone(&self.state),
        }
    }
}

impl ConnectionManager {
    /// Creates a manager and spawns its event loop.
    ///
    /// No connection is attempted until [`connect`](Self::connect).
    #[must_use]
    pub fn new(options: ManagerOptions) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(SubscriberRegistry::new());
        let state = Arc::new(Mutex::new(TransportState::idle()));

        tokio::spawn(run_event_loop(
            options,
            command_rx,
            Arc::clone(&registry),
            Arc::clone(&state),
        ));

        Self {
            command_tx,
            registry,
            state,
        }
    }

    /// Opens a connection to the configured target.
    ///
    /// No-op if a connection is already open. A loopback target in a
    /// deployed context is refused up front with a terminal
    /// `Misconfigured` state and consumes no reconnect attempt.
    pub fn connect(&self) {
        let _ = self.command_tx.send(ManagerCommand::Connect { url: None });
    }

    /// Opens a connection to an explicit target URL.
    ///
    /// Same semantics as [`connect`](Self::connect).
    pub fn connect_to(&self, url: impl Into<String>) {
        let _ = self.command_tx.send(ManagerCommand::Connect {
            url: Some(url.into()),
        });
    }

    /// Writes text to the relay.
    ///
    /// While not connected the text is dropped, not queued.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no connection is open
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send(&self, text: impl Into<String>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(ManagerCommand::Send {
                text: text.into(),
                reply: reply_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        reply_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Intentional shutdown.
    ///
    /// Closes the active transport and cancels any pending reconnect
    /// timer, so a stale timer can never reopen a connection after a
    /// deliberate disconnect.
    pub fn disconnect(&self) {
        let _ = self.command_tx.send(ManagerCommand::Disconnect);
    }

    /// Subscribes to inbound frames (chat data and relay notices).
    ///
    /// Handlers run synchronously on the event-loop task, in registration
    /// order; a panicking handler does not block the rest.
    pub fn on_message(&self, handler: impl Fn(&Frame) + Send + Sync + 'static) -> SubscriptionToken {
        self.registry.on_message(handler)
    }

    /// Subscribes to transport state changes.
    pub fn on_connection_change(
        &self,
        handler: impl Fn(TransportState) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        self.registry.on_connection_change(handler)
    }

    /// Removes a subscription.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.registry.unsubscribe(token)
    }

    /// Returns the current transport state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> TransportState {
        *self.state.lock()
    }

    /// Returns `true` if the transport is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Owns the transport and all state transitions.
async fn run_event_loop(
    options: ManagerOptions,
    mut command_rx: mpsc::UnboundedReceiver<ManagerCommand>,
    registry: Arc<SubscriberRegistry>,
    state: Arc<Mutex<TransportState>>,
) {
    'idle: loop {
        // Disconnected (initial or terminal): only an external connect
        // starts a new cycle.
        let requested = loop {
            match command_rx.recv().await {
                Some(ManagerCommand::Connect { url }) => break url,
                Some(ManagerCommand::Send { reply, .. }) => {
                    let _ = reply.send(Err(Error::NotConnected));
                }
                Some(ManagerCommand::Disconnect) => {}
                None => return,
            }
        };

        let Some(mut target) =
            resolve_guarded(&options, requested.as_deref(), &registry, &state)
        else {
            continue 'idle;
        };

        let mut attempts: u32 = 0;
        'session: loop {
            set_state(&state, &registry, TransportState::Connecting);

            match connect_async(target.as_str()).await {
                Ok((ws, _response)) => {
                    attempts = 0;
                    debug!(target = %target, "connected");
                    set_state(&state, &registry, TransportState::Connected);

                    match drive_connection(ws, &mut command_rx, &registry).await {
                        SessionEnd::Manual => {
                            set_state(
                                &state,
                                &registry,
                                TransportState::Disconnected {
                                    reason: DisconnectReason::Requested,
                                },
                            );
                            continue 'idle;
                        }
                        SessionEnd::HandlesDropped => return,
                        SessionEnd::Dropped(reason) => {
                            debug!(target = %target, reason = %reason, "connection dropped");
                            set_state(
                                &state,
                                &registry,
                                TransportState::Disconnected {
                                    reason: DisconnectReason::ConnectionLost,
                                },
                            );
                        }
                    }
                }
                Err(e) => {
                    debug!(target = %target, error = %e, "connect failed");
                    registry.dispatch_frame(&Frame::Control(ControlNotice::error(format!(
                        "Connection error: {e}"
                    ))));
                    set_state(
                        &state,
                        &registry,
                        TransportState::Disconnected {
                            reason: DisconnectReason::ConnectionLost,
                        },
                    );
                }
            }

            // Schedule the next attempt against the same resolved target,
            // or go terminal at the cap.
            if attempts >= options.policy.max_attempts {
                warn!(target = %target, attempts, "reconnect attempts exhausted");
                registry.dispatch_frame(&Frame::Control(ControlNotice::error(
                    Error::attempts_exhausted(attempts).to_string(),
                )));
                set_state(
                    &state,
                    &registry,
                    TransportState::Disconnected {
                        reason: DisconnectReason::AttemptsExhausted,
                    },
                );
                continue 'idle;
            }
            attempts += 1;
            let delay = options.policy.delay_for(attempts);
            set_state(&state, &registry, TransportState::Reconnecting { attempt: attempts });
            debug!(attempt = attempts, delay_ms = delay.as_millis() as u64, "reconnect scheduled");

            let deadline = Instant::now() + delay;
            loop {
                tokio::select! {
                    () = sleep_until(deadline) => continue 'session,
                    command = command_rx.recv() => match command {
                        Some(ManagerCommand::Disconnect) => {
                            debug!("pending reconnect cancelled");
                            set_state(
                                &state,
                                &registry,
                                TransportState::Disconnected {
                                    reason: DisconnectReason::Requested,
                                },
                            );
                            continue 'idle;
                        }
                        Some(ManagerCommand::Connect { url }) => {
                            // External connect overrides the timer.
                            match resolve_guarded(&options, url.as_deref(), &registry, &state) {
                                Some(next) => {
                                    target = next;
                                    attempts = 0;
                                    continue 'session;
                                }
                                None => continue 'idle,
                            }
                        }
                        Some(ManagerCommand::Send { reply, .. }) => {
                            let _ = reply.send(Err(Error::NotConnected));
                        }
                        None => return,
                    }
                }
            }
        }
    }
}

/// Drives one open connection until it ends.
async fn drive_connection(
    ws: WsClient,
    command_rx: &mut mpsc::UnboundedReceiver<ManagerCommand>,
    registry: &SubscriberRegistry,
) -> SessionEnd {
    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            message = ws_rx.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    registry.dispatch_frame(&Frame::decode(&text));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    registry.dispatch_frame(&Frame::decode(&text));
                }
                Some(Ok(Message::Close(_))) | None => {
                    return SessionEnd::Dropped("closed by remote".to_owned());
                }
                Some(Err(e)) => {
                    // Transport errors surface as an error notice, never
                    // as a panic or an error thrown past the manager.
                    registry.dispatch_frame(&Frame::Control(ControlNotice::error(format!(
                        "Connection error: {e}"
                    ))));
                    return SessionEnd::Dropped(e.to_string());
                }
                // Ping/Pong handled by tungstenite.
                Some(Ok(_)) => {}
            },

            command = command_rx.recv() => match command {
                Some(ManagerCommand::Send { text, reply }) => {
                    let result = send_text(&mut ws_tx, text).await;
                    let failed = result.is_err();
                    let _ = reply.send(result);
                    if failed {
                        return SessionEnd::Dropped("send failed".to_owned());
                    }
                }
                Some(ManagerCommand::Disconnect) => {
                    let _ = ws_tx.close().await;
                    return SessionEnd::Manual;
                }
                Some(ManagerCommand::Connect { .. }) => {
                    debug!("connect ignored; already connected");
                }
                None => {
                    let _ = ws_tx.close().await;
                    return SessionEnd::HandlesDropped;
                }
            },
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn send_text(ws_tx: &mut WsClientSink, text: String) -> Result<()> {
    ws_tx.send(Message::Text(text.into())).await?;
    Ok(())
}

/// Resolves the effective target and applies the misconfiguration guard.
///
/// Returns `None` after dispatching the terminal `Misconfigured` state;
/// no reconnect attempt is consumed for a target that can never be
/// reachable.
fn resolve_guarded(
    options: &ManagerOptions,
    explicit: Option<&str>,
    registry: &SubscriberRegistry,
    state: &Mutex<TransportState>,
) -> Option<String> {
    let target = options.resolve_target(explicit);

    if options.context.is_deployed() && is_loopback_target(&target) {
        warn!(target = %target, "loopback target in deployed context; refusing to connect");
        registry.dispatch_frame(&Frame::Control(ControlNotice::error(
            Error::misconfigured(&target).to_string(),
        )));
        set_state(
            state,
            registry,
            TransportState::Disconnected {
                reason: DisconnectReason::Misconfigured,
            },
        );
        return None;
    }

    Some(target)
}

/// Returns `true` if the target URL points at a loopback address.
fn is_loopback_target(target: &str) -> bool {
    let Ok(url) = Url::parse(target) else {
        return false;
    };
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Stores the new state and notifies subscribers on change.
fn set_state(state: &Mutex<TransportState>, registry: &SubscriberRegistry, next: TransportState) {
    let changed = {
        let mut guard = state.lock();
        if *guard == next {
            false
        } else {
            *guard = next;
            true
        }
    };
    if changed {
        registry.dispatch_state(next);
    }
}

// ============================================================================
// Tests
// ============================================================================
