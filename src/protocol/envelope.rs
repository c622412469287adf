//! Discriminated frame envelope.
//!
//! The browser-facing channel multiplexes relay status notices with opaque
//! chat text. [`Frame`] makes the distinction explicit in the type system
//! instead of leaving "try JSON, else raw" scattered across consumers.
//!
//! # Wire Format
//!
//! Control notice (relay → browser only):
//!
//! ```json
//! {"type": "connected", "message": "Connected to chat server"}
//! ```
//!
//! Raw data: any other text frame, passed through verbatim in both
//! directions. The relay never inspects it.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// ControlKind
// ============================================================================

/// Kind of a control notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    /// Backend connection established for this pair.
    Connected,
    /// Backend connection closed.
    Disconnected,
    /// Backend connection failed or errored.
    Error,
}

// ============================================================================
// ControlNotice
// ============================================================================

/// Out-of-band status message from the relay.
///
/// Exactly one notice is sent per pair lifecycle event: one `connected`
/// on successful backend dial, then one `disconnected` or `error` when the
/// backend side ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlNotice {
    /// Notice kind.
    #[serde(rename = "type")]
    pub kind: ControlKind,

    /// Human-readable reason, rendered by the UI layer.
    pub message: String,
}

impl ControlNotice {
    /// Creates a `connected` notice.
    #[inline]
    #[must_use]
    pub fn connected(message: impl Into<String>) -> Self {
        Self {
            kind: ControlKind::Connected,
            message: message.into(),
        }
    }

    /// Creates a `disconnected` notice.
    #[inline]
    #[must_use]
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self {
            kind: ControlKind::Disconnected,
            message: message.into(),
        }
    }

    /// Creates an `error` notice.
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ControlKind::Error,
            message: message.into(),
        }
    }

    /// Serializes the notice to its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Frame
// ============================================================================

/// A single inbound or outbound text frame on the browser-facing channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Relay status notice.
    Control(ControlNotice),
    /// Opaque chat text, forwarded verbatim.
    Data(String),
}

impl Frame {
    /// Classifies an inbound text frame.
    ///
    /// A frame is a control notice only if it deserializes to the exact
    /// `{"type", "message"}` shape with a known kind; everything else is
    /// raw data. Chat lines that merely look like JSON stay data.
    #[must_use]
    pub fn decode(text: &str) -> Self {
        match serde_json::from_str::<ControlNotice>(text) {
            Ok(notice) => Self::Control(notice),
            Err(_) => Self::Data(text.to_owned()),
        }
    }

    /// Produces the outbound wire text for this frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if a control notice
    /// fails to serialize.
    pub fn encode(&self) -> Result<String> {
        match self {
            Self::Control(notice) => notice.encode(),
            Self::Data(text) => Ok(text.clone()),
        }
    }

    /// Returns `true` if this is a control frame.
    #[inline]
    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Control(_))
    }

    /// Returns the raw data payload, if any.
    #[inline]
    #[must_use]
    pub fn as_data(&self) -> Option<&str> {
        match self {
            Self::Data(text) => Some(text),
            Self::Control(_) => None,
        }
    }
}

impl From<ControlNotice> for Frame {
    #[inline]
    fn from(notice: ControlNotice) -> Self {
        Self::Control(notice)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_control_notice_wire_shape() {
        let notice = ControlNotice::connected("Connected to chat server");
        let json = notice.encode().unwrap();
        assert_eq!(
            json,
            r#"{"type":"connected","message":"Connected to chat server"}"#
        );
    }

    #[test]
    fn test_decode_control() {
        let frame = Frame::decode(r#"{"type":"error","message":"Connection error: refused"}"#);
        assert_eq!(
            frame,
            Frame::Control(ControlNotice::error("Connection error: refused"))
        );
    }

    #[test]
    fn test_decode_plain_text_is_data() {
        let frame = Frame::decode("alice: hello there\n");
        assert_eq!(frame.as_data(), Some("alice: hello there\n"));
    }

    #[test]
    fn test_decode_unknown_type_is_data() {
        // Valid JSON but not a known control kind.
        let text = r#"{"type":"shutdown","message":"bye"}"#;
        assert_eq!(Frame::decode(text), Frame::Data(text.to_owned()));
    }

    #[test]
    fn test_decode_extra_fields_is_data() {
        // Chat payloads that resemble a notice but carry extra fields stay
        // opaque data.
        let text = r#"{"type":"error","message":"x","sender":"bob"}"#;
        assert_eq!(Frame::decode(text), Frame::Data(text.to_owned()));
    }

    #[test]
    fn test_decode_roundtrip_control() {
        let notice = ControlNotice::disconnected("Connection to server lost");
        let frame = Frame::decode(&notice.encode().unwrap());
        assert_eq!(frame, Frame::Control(notice));
    }

    #[test]
    fn test_data_encode_is_verbatim() {
        let frame = Frame::Data("/msg bob hi".to_owned());
        assert_eq!(frame.encode().unwrap(), "/msg bob hi");
    }

    proptest! {
        // Anything that fails to classify as a control notice must come
        // back out byte-for-byte as data.
        #[test]
        fn prop_non_control_text_passes_through(text in ".*") {
            let frame = Frame::decode(&text);
            if let Frame::Data(payload) = &frame {
                prop_assert_eq!(payload, &text);
                prop_assert_eq!(frame.encode().unwrap(), text);
            }
        }

        #[test]
        fn prop_control_roundtrip(message in ".*") {
            let notice = ControlNotice::error(message);
            let decoded = Frame::decode(&notice.encode().unwrap());
            prop_assert_eq!(decoded, Frame::Control(notice));
        }
    }
}
