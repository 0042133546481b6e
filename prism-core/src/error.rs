//! Domain-specific error types for the relay.
//!
//! All fallible operations return `Result<T, Error>`.
//! No panics on invalid input; every error is typed and recoverable.

use thiserror::Error;

/// The canonical error type for the relay library.
#[derive(Debug, Error)]
pub enum Error {
    // ── Wire Errors ──────────────────────────────────────────────
    /// Received bytes that do not start with the envelope magic.
    #[error("invalid magic bytes: expected PRM1")]
    InvalidMagic,

    /// A field in the envelope header could not be parsed.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    /// The envelope payload failed checksum verification.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    // ── Frame Errors ─────────────────────────────────────────────
    /// A raw frame matched neither the grayscale nor the
    /// three-channel byte length for the configured geometry.
    #[error(
        "frame size mismatch: expected {expected_gray} (gray) or {expected_rgb} (rgb) bytes, got {actual}"
    )]
    SizeMismatch {
        expected_gray: usize,
        expected_rgb: usize,
        actual: usize,
    },

    /// A payload carried the zstd magic but failed to decompress.
    #[error("decompression failed: {0}")]
    Decompress(String),

    /// The JPEG encoder rejected a color frame.
    #[error("jpeg encoding failed: {0}")]
    JpegEncode(String),

    // ── Control Errors ───────────────────────────────────────────
    /// A viewer control message was not valid JSON of the expected shape.
    #[error("malformed control message: {0}")]
    Control(#[from] serde_json::Error),

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,
}

// ── Convenient From implementations ──────────────────────────────

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::ChannelClosed
    }
}
