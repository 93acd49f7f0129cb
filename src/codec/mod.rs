//! Metadata codecs
//!
//! A codec turns a flat string map into the bytes stored after the vendor
//! magic of a metadata segment, and back. The scanner and manager never look
//! inside those bytes; they only hand them to the codec resolved from the
//! vendor registry.

use crate::error::Result;
use std::collections::BTreeMap;

#[cfg(feature = "gzip")]
pub mod gzip;
pub mod tinymeta;

#[cfg(feature = "gzip")]
pub use gzip::TinyMetaGzip;
pub use tinymeta::TinyMeta;

/// Key/value metadata fields
///
/// Ordered so that encoding is deterministic.
pub type Fields = BTreeMap<String, String>;

/// Encoder/decoder for a metadata payload
pub trait MetaCodec: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Serialize `fields` into payload bytes
    fn encode(&self, fields: &Fields) -> Result<Vec<u8>>;

    /// Parse payload bytes back into fields
    fn decode(&self, data: &[u8]) -> Result<Fields>;
}
