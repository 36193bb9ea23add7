//! Codec-level error type shared across the workspace.
//!
//! These errors cover wire-format violations found while encoding or
//! decoding frames. Dispatch-level failures (timeouts, disconnects,
//! cancellation) live in the engine crate; transport failures live in the
//! hardware crate.

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the frame codecs and table decoder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame shorter than the envelope minimum.
    #[error("frame too short: {len} bytes, need at least {min}")]
    FrameTooShort { len: usize, min: usize },

    /// Trailer checksum did not match the computed value.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Declared payload length exceeds the bytes actually present.
    #[error("declared length {declared} exceeds available {available} bytes")]
    LengthOverrun { declared: usize, available: usize },

    /// Envelope byte (sync, report kind, length) outside the protocol.
    #[error("invalid envelope: {reason}")]
    InvalidEnvelope { reason: String },

    /// Menu command body violates the tag/sub-tag grammar.
    #[error("invalid menu body: {reason}")]
    InvalidMenuBody { reason: String },

    /// Bill-table bytes end in the middle of a record.
    #[error("bill table record truncated at offset {offset}")]
    TableRecordTruncated { offset: usize },

    /// Command payload too large for the envelope's length field.
    #[error("payload of {len} bytes exceeds envelope maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new invalid-envelope error.
    pub fn invalid_envelope(reason: impl Into<String>) -> Self {
        Self::InvalidEnvelope {
            reason: reason.into(),
        }
    }

    /// Create a new invalid-menu-body error.
    pub fn invalid_menu_body(reason: impl Into<String>) -> Self {
        Self::InvalidMenuBody {
            reason: reason.into(),
        }
    }
}
