//! Marker segments and the segment cache

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

/// Size of the marker field and of the length field
pub const HEADER_SIZE: usize = 2;

/// Largest value the 2-byte length field can carry
pub const DATA_MAX_SIZE: usize = u16::MAX as usize;

/// Start of Scan - image data follows
pub const SOS_MARKER: u16 = 0xFFDA;

/// First application marker (APP0)
pub const APP0_MARKER: u16 = 0xFFE0;

/// Last application marker (APP15)
pub const APP15_MARKER: u16 = 0xFFEF;

/// Get human-readable label for a JPEG marker
pub fn marker_label(marker: u16) -> &'static str {
    match marker {
        0xFFD8 => "SOI",
        0xFFD9 => "EOI",
        0xFFDA => "SOS",
        0xFFDB => "DQT",
        0xFFC0 => "SOF0",
        0xFFC2 => "SOF2",
        0xFFC4 => "DHT",
        0xFFDD => "DRI",
        0xFFFE => "COM",
        0xFFE0 => "APP0",
        0xFFE1 => "APP1",
        0xFFE2 => "APP2",
        0xFFE3 => "APP3",
        0xFFE4 => "APP4",
        0xFFE5 => "APP5",
        0xFFE6 => "APP6",
        0xFFE7 => "APP7",
        0xFFE8 => "APP8",
        0xFFE9 => "APP9",
        0xFFEA => "APP10",
        0xFFEB => "APP11",
        0xFFEC => "APP12",
        0xFFED => "APP13",
        0xFFEE => "APP14",
        0xFFEF => "APP15",
        _ => "OTHER",
    }
}

/// Check whether `marker` is one of the application markers APP0..APP15
pub fn is_app_marker(marker: u16) -> bool {
    (APP0_MARKER..=APP15_MARKER).contains(&marker)
}

/// One raw marker segment: `[marker][length][payload]`
///
/// The length field counts itself plus the payload, so a segment is always
/// `HEADER_SIZE + length` bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    bytes: Vec<u8>,
}

impl Segment {
    /// Wrap bytes read from a stream.
    ///
    /// Callers guarantee at least a full marker + length header.
    pub(crate) fn from_raw(bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.len() >= 2 * HEADER_SIZE);
        Self { bytes }
    }

    /// Build a metadata segment: `[marker][length][vendor magic][data]`
    ///
    /// # Errors
    /// - `DataTooLarge`: length field + vendor magic + data exceed [`DATA_MAX_SIZE`]
    pub fn build(marker: u16, vendor_magic: &[u8], data: &[u8]) -> Result<Self> {
        let data_size = data_size(vendor_magic, data)?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data_size);
        bytes.write_u16::<BigEndian>(marker)?;
        bytes.write_u16::<BigEndian>(data_size as u16)?;
        bytes.extend_from_slice(vendor_magic);
        bytes.extend_from_slice(data);
        Ok(Self { bytes })
    }

    /// Marker identifying this segment
    pub fn marker(&self) -> u16 {
        BigEndian::read_u16(&self.bytes[..HEADER_SIZE])
    }

    /// Value of the length field
    pub fn length(&self) -> u16 {
        BigEndian::read_u16(&self.bytes[HEADER_SIZE..2 * HEADER_SIZE])
    }

    /// Everything after the length field
    pub fn payload(&self) -> &[u8] {
        &self.bytes[2 * HEADER_SIZE..]
    }

    /// The complete segment as stored in the file
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total size in bytes including marker and length field
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the segment holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check whether this segment carries `marker` and its payload starts with `vendor_magic`
    ///
    /// A segment too short to hold the vendor magic never matches.
    pub fn matches(&self, marker: u16, vendor_magic: &[u8]) -> bool {
        self.marker() == marker
            && self.bytes.len() >= 2 * HEADER_SIZE + vendor_magic.len()
            && self.payload().starts_with(vendor_magic)
    }

    /// Encoded data stored after `vendor_magic`
    ///
    /// Returns an empty slice if the payload is shorter than the magic.
    pub fn vendor_data(&self, vendor_magic: &[u8]) -> &[u8] {
        self.payload().get(vendor_magic.len()..).unwrap_or(&[])
    }

    /// Replace the data after `vendor_magic`, keeping marker and magic, and rewrite the length field
    ///
    /// # Errors
    /// - `DataTooLarge`: the new data would not fit the length field; the segment is left unchanged
    pub fn replace_vendor_data(&mut self, vendor_magic: &[u8], data: &[u8]) -> Result<()> {
        let data_size = data_size(vendor_magic, data)?;

        self.bytes.truncate(2 * HEADER_SIZE + vendor_magic.len());
        self.bytes.extend_from_slice(data);
        BigEndian::write_u16(
            &mut self.bytes[HEADER_SIZE..2 * HEADER_SIZE],
            data_size as u16,
        );
        Ok(())
    }
}

/// Value of the length field for `vendor_magic` + `data`, checked against [`DATA_MAX_SIZE`]
fn data_size(vendor_magic: &[u8], data: &[u8]) -> Result<usize> {
    let size = HEADER_SIZE + vendor_magic.len() + data.len();
    if size > DATA_MAX_SIZE {
        return Err(Error::DataTooLarge {
            size,
            max: DATA_MAX_SIZE,
        });
    }
    Ok(size)
}

/// Segments already read from the stream, plus segments inserted this session
///
/// Order is the order segments will be written back after the file prefix.
/// Scanned segments are appended; inserted segments go to the front.
#[derive(Debug, Default)]
pub struct SegmentCache {
    segments: Vec<Segment>,
}

impl SegmentCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment read from the stream
    pub fn push(&mut self, segment: Segment) -> usize {
        self.segments.push(segment);
        self.segments.len() - 1
    }

    /// Place a new segment ahead of every known segment
    pub fn prepend(&mut self, segment: Segment) {
        self.segments.insert(0, segment);
    }

    /// Index of the first segment matching `marker` and `vendor_magic`
    pub fn find(&self, marker: u16, vendor_magic: &[u8]) -> Option<usize> {
        self.segments
            .iter()
            .position(|s| s.matches(marker, vendor_magic))
    }

    /// Get a segment by index
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Get a mutable segment by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Segment> {
        self.segments.get_mut(index)
    }

    /// Number of cached segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterate segments in output order
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }
}
