//! Observer registry for inbound frames and state changes.
//!
//! Replaces ad hoc handler sets with an explicit registry: subscribing
//! returns a stable [`SubscriptionToken`], multiple independent
//! subscribers are supported, and dispatch runs synchronously in
//! registration order on the manager's event-loop task.
//!
//! A panicking handler is isolated: it is caught, logged, and the
//! remaining handlers in the same dispatch still run.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::warn;

use crate::protocol::Frame;

use super::state::TransportState;

// ============================================================================
// Types
// ============================================================================

/// Handler for inbound frames (raw chat data and relay notices).
type MessageHandler = Arc<dyn Fn(&Frame) + Send + Sync>;

/// Handler for transport state changes.
type ConnectionHandler = Arc<dyn Fn(TransportState) + Send + Sync>;

// ============================================================================
// SubscriptionToken
// ============================================================================

/// Which handler list a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerKind {
    Message,
    Connection,
}

/// Stable handle for removing a subscription.
///
/// Tokens are never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "dropping the token makes the subscription permanent"]
pub struct SubscriptionToken {
    kind: HandlerKind,
    id: u64,
}

// ============================================================================
// SubscriberRegistry
// ============================================================================

/// Token-keyed observer registry.
///
/// Registration order is dispatch order: tokens are handed out from a
/// monotonic counter and handlers are stored keyed by token, so iterating
/// the map visits subscribers in the order they subscribed.
#[derive(Default)]
pub struct SubscriberRegistry {
    /// Token id source.
    next_id: AtomicU64,
    /// Frame subscribers.
    message_handlers: Mutex<BTreeMap<u64, MessageHandler>>,
    /// State-change subscribers.
    connection_handlers: Mutex<BTreeMap<u64, ConnectionHandler>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to inbound frames.
    pub fn on_message(&self, handler: impl Fn(&Frame) + Send + Sync + 'static) -> SubscriptionToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.message_handlers.lock().insert(id, Arc::new(handler));
        SubscriptionToken {
            kind: HandlerKind::Message,
            id,
        }
    }

    /// Subscribes to transport state changes.
    pub fn on_connection_change(
        &self,
        handler: impl Fn(TransportState) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connection_handlers.lock().insert(id, Arc::new(handler));
        SubscriptionToken {
            kind: HandlerKind::Connection,
            id,
        }
    }

    /// Removes a subscription.
    ///
    /// Returns `false` if the token was already removed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        match token.kind {
            HandlerKind::Message => self.message_handlers.lock().remove(&token.id).is_some(),
            HandlerKind::Connection => self.connection_handlers.lock().remove(&token.id).is_some(),
        }
    }

    /// Dispatches a frame to all message subscribers in registration order.
    pub fn dispatch_frame(&self, frame: &Frame) {
        // Snapshot so handlers can subscribe/unsubscribe without
        // deadlocking against the dispatch.
        let handlers: Vec<MessageHandler> =
            self.message_handlers.lock().values().cloned().collect();

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(frame))).is_err() {
                warn!("message handler panicked; continuing with remaining handlers");
            }
        }
    }

    /// Dispatches a state change to all connection subscribers in
    /// registration order.
    pub fn dispatch_state(&self, state: TransportState) {
        let handlers: Vec<ConnectionHandler> =
            self.connection_handlers.lock().values().cloned().collect();

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(state))).is_err() {
                warn!("connection handler panicked; continuing with remaining handlers");
            }
        }
    }

    /// Returns the number of message subscribers.
    #[must_use]
    pub fn message_subscriber_count(&self) -> usize {
        self.message_handlers.lock().len()
    }

    /// Returns the number of connection subscribers.
    #[must_use]
    pub fn connection_subscriber_count(&self) -> usize {
        self.connection_handlers.lock().len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::manager::state::DisconnectReason;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Clone) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let log = Arc::clone(&log);
            move |entry: &str| log.lock().push(entry.to_owned())
        };
        (log, sink)
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let registry = SubscriberRegistry::new();
        let (log, sink) = recorder();

        for name in ["first", "second", "third"] {
            let sink = sink.clone();
            let _token = registry.on_message(move |_| sink(name));
        }

        registry.dispatch_frame(&Frame::Data("hi".into()));
        assert_eq!(*log.lock(), ["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_stops_dispatch() {
        let registry = SubscriberRegistry::new();
        let (log, sink) = recorder();

        let keep = {
            let sink = sink.clone();
            registry.on_message(move |_| sink("keep"))
        };
        let drop_me = {
            let sink = sink.clone();
            registry.on_message(move |_| sink("drop"))
        };

        assert!(registry.unsubscribe(drop_me));
        assert!(!registry.unsubscribe(drop_me));

        registry.dispatch_frame(&Frame::Data("hi".into()));
        assert_eq!(*log.lock(), ["keep"]);

        assert!(registry.unsubscribe(keep));
        assert_eq!(registry.message_subscriber_count(), 0);
    }

    #[test]
    fn test_panicking_handler_does_not_block_later_handlers() {
        let registry = SubscriberRegistry::new();
        let (log, sink) = recorder();

        {
            let sink = sink.clone();
            let _ = registry.on_message(move |_| sink("before"));
        }
        let _ = registry.on_message(|_| panic!("subscriber bug"));
        {
            let sink = sink.clone();
            let _ = registry.on_message(move |_| sink("after"));
        }

        registry.dispatch_frame(&Frame::Data("hi".into()));
        assert_eq!(*log.lock(), ["before", "after"]);
    }

    #[test]
    fn test_message_and_connection_tokens_are_independent() {
        let registry = SubscriberRegistry::new();
        let (log, sink) = recorder();

        let message_token = {
            let sink = sink.clone();
            registry.on_message(move |_| sink("frame"))
        };
        let connection_token = {
            let sink = sink.clone();
            registry.on_connection_change(move |_| sink("state"))
        };

        registry.dispatch_state(TransportState::Disconnected {
            reason: DisconnectReason::ConnectionLost,
        });
        assert_eq!(*log.lock(), ["state"]);

        assert!(registry.unsubscribe(connection_token));
        assert!(registry.unsubscribe(message_token));
        assert_eq!(registry.connection_subscriber_count(), 0);
    }

    #[test]
    fn test_handler_may_unsubscribe_during_dispatch() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (log, sink) = recorder();

        let token_cell = Arc::new(Mutex::new(None::<SubscriptionToken>));
        let token = {
            let reg = Arc::clone(&registry);
            let token_cell = Arc::clone(&token_cell);
            let sink = sink.clone();
            registry.on_message(move |_| {
                sink("once");
                if let Some(token) = token_cell.lock().take() {
                    reg.unsubscribe(token);
                }
            })
        };
        *token_cell.lock() = Some(token);

        registry.dispatch_frame(&Frame::Data("a".into()));
        registry.dispatch_frame(&Frame::Data("b".into()));
        assert_eq!(*log.lock(), ["once"]);
    }
}
