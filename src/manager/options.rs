//! Connection manager configuration.
//!
//! # Example
//!
//! ```ignore
//! use chat_bridge::{ManagerOptions, ReconnectPolicy, RuntimeContext};
//!
//! let options = ManagerOptions::new()
//!     .with_url("ws://chat.example.net:8080")
//!     .with_context(RuntimeContext::Deployed)
//!     .with_policy(ReconnectPolicy::new().with_max_attempts(5));
//! ```

// ============================================================================
// Imports
// ============================================================================

use super::state::{ReconnectPolicy, RuntimeContext};

// ============================================================================
// Constants
// ============================================================================

/// Hardcoded fallback target when neither an explicit URL nor a configured
/// default is given.
pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:8080";

// ============================================================================
// ManagerOptions
// ============================================================================

/// Configuration for a [`ConnectionManager`](super::ConnectionManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Configured default relay URL. An explicit `connect_to` argument
    /// takes precedence; [`DEFAULT_RELAY_URL`] is the final fallback.
    pub url: Option<String>,

    /// Reconnect backoff policy.
    pub policy: ReconnectPolicy,

    /// Runtime context for the misconfiguration guard.
    pub context: RuntimeContext,
}

impl ManagerOptions {
    /// Creates options with the default policy and a local context.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            url: None,
            policy: ReconnectPolicy::new(),
            context: RuntimeContext::Local,
        }
    }

    /// Sets the configured default relay URL.
    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the runtime context.
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: RuntimeContext) -> Self {
        self.context = context;
        self
    }

    /// Resolves the effective target: explicit argument, else configured
    /// default, else the hardcoded fallback.
    #[must_use]
    pub fn resolve_target(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.url.clone())
            .unwrap_or_else(|| DEFAULT_RELAY_URL.to_owned())
    }
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_precedence() {
        let bare = ManagerOptions::new();
        assert_eq!(bare.resolve_target(None), DEFAULT_RELAY_URL);

        let configured = ManagerOptions::new().with_url("ws://relay:9000");
        assert_eq!(configured.resolve_target(None), "ws://relay:9000");
        assert_eq!(
            configured.resolve_target(Some("ws://other:9001")),
            "ws://other:9001"
        );
    }

    #[test]
    fn test_builder_methods() {
        let policy = ReconnectPolicy::new().with_max_attempts(3);
        let options = ManagerOptions::new()
            .with_policy(policy)
            .with_context(RuntimeContext::Deployed);

        assert_eq!(options.policy.max_attempts, 3);
        assert!(options.context.is_deployed());
    }
}
