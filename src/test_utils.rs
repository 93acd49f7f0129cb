//! Test utilities for building synthetic JPEG streams.
//!
//! Real photos are not needed to exercise metadata segments: the scanner
//! treats every segment before SOS as opaque bytes, so a handful of
//! hand-built segments covers every code path.
//!
//! # Usage
//!
//! ```
//! use tinymeta_io::test_utils::*;
//!
//! let jpeg = JpegBuilder::new()
//!     .app0_jfif()
//!     .tinymeta(&[("artist", "A")])
//!     .sos()
//!     .image_data(&[0x12, 0x34])
//!     .eoi()
//!     .build();
//! assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
//! ```

use crate::{
    codec::{Fields, MetaCodec, TinyMeta},
    media_type::JPEG_MAGIC,
    segment::{APP0_MARKER, SOS_MARKER},
};

/// Build a field map from string pairs
pub fn fields(pairs: &[(&str, &str)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Raw segment bytes: `[marker][length][payload]`
///
/// Panics if the payload does not fit a length field.
pub fn raw_segment(marker: u16, payload: &[u8]) -> Vec<u8> {
    let length = u16::try_from(payload.len() + 2).expect("payload too large for a segment");
    let mut segment = Vec::with_capacity(payload.len() + 4);
    segment.extend_from_slice(&marker.to_be_bytes());
    segment.extend_from_slice(&length.to_be_bytes());
    segment.extend_from_slice(payload);
    segment
}

/// Metadata segment bytes: `[marker][length][vendor][0x00][data]`
pub fn metadata_segment(marker: u16, vendor: &str, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(vendor.len() + 1 + data.len());
    payload.extend_from_slice(vendor.as_bytes());
    payload.push(0);
    payload.extend_from_slice(data);
    raw_segment(marker, &payload)
}

/// Builder for synthetic JPEG byte streams
///
/// Starts with the SOI magic; segments are appended in call order.
#[derive(Debug, Clone)]
pub struct JpegBuilder {
    bytes: Vec<u8>,
}

impl JpegBuilder {
    /// Start a stream containing only the SOI magic
    pub fn new() -> Self {
        Self {
            bytes: JPEG_MAGIC.to_vec(),
        }
    }

    /// Append a segment with a computed length field
    pub fn segment(mut self, marker: u16, payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(&raw_segment(marker, payload));
        self
    }

    /// Append a JFIF APP0 header
    pub fn app0_jfif(self) -> Self {
        self.segment(
            APP0_MARKER,
            &[b'J', b'F', b'I', b'F', 0, 1, 1, 0, 0, 1, 0, 1, 0, 0],
        )
    }

    /// Append a quantization table segment
    pub fn dqt(self) -> Self {
        let mut table = vec![0u8];
        table.extend(1..=64u8);
        self.segment(0xFFDB, &table)
    }

    /// Append a metadata segment for `vendor` carrying `data`
    pub fn metadata(mut self, marker: u16, vendor: &str, data: &[u8]) -> Self {
        self.bytes
            .extend_from_slice(&metadata_segment(marker, vendor, data));
        self
    }

    /// Append a `tinymeta` segment (APP0, plain JSON)
    pub fn tinymeta(self, pairs: &[(&str, &str)]) -> Self {
        let data = TinyMeta
            .encode(&fields(pairs))
            .expect("string fields always encode");
        self.metadata(APP0_MARKER, "tinymeta", &data)
    }

    /// Append a minimal SOS header (length 2, no components)
    pub fn sos(self) -> Self {
        self.segment(SOS_MARKER, &[])
    }

    /// Append entropy-coded image data
    pub fn image_data(self, data: &[u8]) -> Self {
        self.raw(data)
    }

    /// Append EOI
    pub fn eoi(self) -> Self {
        self.raw(&[0xFF, 0xD9])
    }

    /// Append arbitrary bytes
    pub fn raw(mut self, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(data);
        self
    }

    /// Finish the stream
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for JpegBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A small but complete JPEG layout without any vendor metadata
pub fn minimal_jpeg() -> Vec<u8> {
    JpegBuilder::new()
        .app0_jfif()
        .dqt()
        .sos()
        .image_data(&[0xF8, 0x00, 0x3F, 0xFF, 0x00, 0x12])
        .eoi()
        .build()
}
