//! Transport state machine and reconnect policy.
//!
//! ```text
//! Disconnected --connect--> Connecting --success--> Connected
//!      ▲                        ▲                      │
//!      │ attempts == cap        │ timer fires          │ drop
//!      │ (terminal)             │                      ▼
//!      └──────────────── Reconnecting <──── Disconnected(ConnectionLost)
//! ```
//!
//! A manual disconnect from any state lands in a terminal `Disconnected`
//! with any pending reconnect timer cancelled.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

// ============================================================================
// DisconnectReason
// ============================================================================

/// Why the transport is (or became) disconnected.
///
/// The UI layer renders terminal reasons differently from transient drops:
/// a `Misconfigured` target needs an actionable deployment message, not an
/// endless "connecting" indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Never connected; initial state.
    Idle,
    /// Transport dropped; reconnection may be pending.
    ConnectionLost,
    /// Manual `disconnect()` call. Terminal.
    Requested,
    /// Reconnect attempt cap reached. Terminal until an external connect.
    AttemptsExhausted,
    /// Loopback target in a deployed context; retrying can never succeed.
    /// Terminal, and no reconnect attempt was consumed.
    Misconfigured,
}

impl DisconnectReason {
    /// Returns `true` if no automatic reconnection follows this reason.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Requested | Self::AttemptsExhausted | Self::Misconfigured
        )
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "not connected",
            Self::ConnectionLost => "connection lost",
            Self::Requested => "disconnected by request",
            Self::AttemptsExhausted => "reconnect attempts exhausted",
            Self::Misconfigured => "misconfigured target",
        };
        f.write_str(text)
    }
}

// ============================================================================
// TransportState
// ============================================================================

/// Connection manager lifecycle state.
///
/// Exactly one instance exists per manager; it is owned by the manager's
/// event loop and observed through state-change subscriptions, never
/// through a process-wide global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No transport open. Carries the reason for being disconnected.
    Disconnected {
        /// Why the transport is down.
        reason: DisconnectReason,
    },
    /// Dial in progress.
    Connecting,
    /// Transport open; sends succeed.
    Connected,
    /// Backoff timer running before the next dial.
    Reconnecting {
        /// 1-based attempt about to be made when the timer fires.
        attempt: u32,
    },
}

impl TransportState {
    /// Initial state: disconnected, never connected.
    #[inline]
    #[must_use]
    pub const fn idle() -> Self {
        Self::Disconnected {
            reason: DisconnectReason::Idle,
        }
    }

    /// Returns `true` if the transport is open.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if no automatic activity will change this state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected { reason } if reason.is_terminal())
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::idle()
    }
}

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Bounded linear backoff for automatic reconnection.
///
/// The attempt counter resets to 0 on every successful open. After
/// `max_attempts` consecutive failures reconnection stops until an
/// external connect call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Consecutive failed attempts before giving up.
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `base_delay × n`.
    pub base_delay: Duration,
}

impl ReconnectPolicy {
    /// Default cap: 10 attempts, 1 second base delay.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Sets the attempt cap.
    #[inline]
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the base delay.
    #[inline]
    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Returns the delay before 1-based attempt `attempt`.
    #[inline]
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// RuntimeContext
// ============================================================================

/// Where the client is running, for the misconfiguration guard.
///
/// A deployed browser can never reach a loopback relay; attempting to
/// retry such a target loops forever. The composition root states the
/// context explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeContext {
    /// Local development: loopback targets are fine.
    #[default]
    Local,
    /// Deployed: loopback targets are rejected up front.
    Deployed,
}

impl RuntimeContext {
    /// Returns `true` for a non-local deployment.
    #[inline]
    #[must_use]
    pub const fn is_deployed(self) -> bool {
        matches!(self, Self::Deployed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = TransportState::default();
        assert_eq!(state, TransportState::idle());
        assert!(!state.is_connected());
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_terminal_reasons() {
        assert!(DisconnectReason::Requested.is_terminal());
        assert!(DisconnectReason::AttemptsExhausted.is_terminal());
        assert!(DisconnectReason::Misconfigured.is_terminal());
        assert!(!DisconnectReason::Idle.is_terminal());
        assert!(!DisconnectReason::ConnectionLost.is_terminal());
    }

    #[test]
    fn test_terminal_state_requires_terminal_reason() {
        let lost = TransportState::Disconnected {
            reason: DisconnectReason::ConnectionLost,
        };
        let exhausted = TransportState::Disconnected {
            reason: DisconnectReason::AttemptsExhausted,
        };

        assert!(!lost.is_terminal());
        assert!(exhausted.is_terminal());
        assert!(!TransportState::Reconnecting { attempt: 2 }.is_terminal());
    }

    #[test]
    fn test_linear_delay_schedule() {
        let policy = ReconnectPolicy::new()
            .with_max_attempts(3)
            .with_base_delay(Duration::from_millis(1000));

        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(3000));
    }

    #[test]
    fn test_runtime_context_default_is_local() {
        assert_eq!(RuntimeContext::default(), RuntimeContext::Local);
        assert!(!RuntimeContext::Local.is_deployed());
        assert!(RuntimeContext::Deployed.is_deployed());
    }
}
