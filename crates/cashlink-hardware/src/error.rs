//! Error types for transport operations.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while moving bytes to or from a device.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device is not connected or has gone away.
    #[error("device disconnected: {device}")]
    Disconnected { device: String },

    /// A write could not be completed.
    #[error("write failed: {message}")]
    WriteFailed { message: String },

    /// The device could not be opened or is unusable.
    #[error("device unavailable: {reason}")]
    Unavailable { reason: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new write-failed error.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }

    /// Create a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}
