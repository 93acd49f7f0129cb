//! Error types for tinymeta-io

use std::io;

/// Result type for tinymeta-io operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or updating embedded metadata
///
/// Every failure keeps its own variant so callers can pick a fallback per
/// kind (for example, `MarkerNotFound` means "insert" to an upsert but is a
/// reportable condition for an extract).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Magic bytes do not match a supported file type
    #[error("Unsupported file type")]
    UnsupportedFileType,

    /// Vendor identifier missing from the registry
    #[error("Vendor not supported: {0}")]
    VendorNotSupported(String),

    /// Marker outside the application marker range (0xFFE0..=0xFFEF)
    #[error("Invalid application marker: 0x{0:04X}")]
    InvalidMarker(u16),

    /// No segment for the requested marker and vendor magic before start of scan
    #[error("Marker not found")]
    MarkerNotFound,

    /// Segment data does not fit the 2-byte length field
    #[error("Data too large: {size} bytes (max: {max})")]
    DataTooLarge { size: usize, max: usize },

    /// Stream ended before a segment could be completed
    #[error("Corrupted segment at offset {offset}: {reason}")]
    CorruptedSegment { offset: u64, reason: String },

    /// Payload is not a flat JSON object of strings
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Payload is not a valid gzip stream
    #[error("Invalid compressed stream: {0}")]
    InvalidCompressedStream(#[source] io::Error),
}
