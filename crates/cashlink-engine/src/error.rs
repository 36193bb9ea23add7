//! Dispatch-level error type.
//!
//! Nothing in this module is fatal to the process: the link degrades to
//! "unavailable" rather than crashing, and reconnection policy belongs to
//! the caller.

use cashlink_core::ChannelIndex;
use cashlink_hardware::TransportError;

/// Result type alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors surfaced to callers of the device link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The device answered with a frame the codec rejected. The link
    /// stays open; only the in-flight request is affected.
    #[error("malformed frame: {reason}")]
    MalformedFrame { reason: String },

    /// No reply arrived within the caller's deadline. The slot is freed
    /// exactly as on a normal reply.
    #[error("no reply within {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The transport failed while the request was outstanding.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The device is gone. Backlogged requests are dropped; no automatic
    /// reconnect is attempted at this layer.
    #[error("device disconnected")]
    Disconnected,

    /// The request was cancelled before completing.
    #[error("request cancelled")]
    Cancelled,

    /// The engine task has terminated; the handle is stale.
    #[error("link closed")]
    LinkClosed,

    /// The operation needs the denomination table, which has not been
    /// received yet.
    #[error("denomination table not received yet")]
    NotReady,

    /// A device event referenced a table slot with no known value.
    /// Soft rejection, not a fault.
    #[error("no known value for {channel}")]
    UnsupportedValue { channel: ChannelIndex },

    /// A command could not be encoded for the wire.
    #[error("codec error: {0}")]
    Codec(#[from] cashlink_core::Error),
}

impl LinkError {
    /// Create a new malformed-frame error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    /// Create a new transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl From<TransportError> for LinkError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Disconnected { .. } => LinkError::Disconnected,
            other => LinkError::transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let error = LinkError::Timeout { duration_ms: 1000 };
        assert_eq!(error.to_string(), "no reply within 1000ms");
    }

    #[test]
    fn test_transport_error_conversion() {
        let error = LinkError::from(TransportError::disconnected("/dev/ttyUSB0"));
        assert!(matches!(error, LinkError::Disconnected));

        let error = LinkError::from(TransportError::write_failed("bus fault"));
        assert!(matches!(error, LinkError::Transport { .. }));
    }

    #[test]
    fn test_codec_error_conversion() {
        let codec = cashlink_core::Error::PayloadTooLarge { len: 300, max: 253 };
        let error = LinkError::from(codec);
        assert!(matches!(error, LinkError::Codec(_)));
    }
}
