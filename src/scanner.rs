//! Incremental marker segment scanner
//!
//! Reads `[marker][length][payload]` segments from a stream one at a time,
//! only as far as needed to answer a lookup. Everything read is appended to
//! the caller's [`SegmentCache`], so a segment is never read twice and the
//! stream cursor only ever moves forward.

use crate::{
    error::{Error, Result},
    segment::{marker_label, Segment, SegmentCache, HEADER_SIZE, SOS_MARKER},
};
use byteorder::{BigEndian, ByteOrder};
use std::io::Read;

/// Where the scanner stands in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// More marker segments may follow
    Scanning,
    /// Start of scan reached; the rest of the stream is image data
    Exhausted,
    /// Stream ended (or failed) inside a segment
    Corrupted,
}

/// Forward-only segment reader over a byte stream
///
/// The stream must be positioned at the start of a marker (right after the
/// file prefix). No filler bytes between segments are expected.
#[derive(Debug)]
pub struct SegmentScanner<R> {
    source: R,
    offset: u64,
    state: ScanState,
    residue: Vec<u8>,
}

impl<R: Read> SegmentScanner<R> {
    /// Create a scanner; `offset` is the stream position, used in error reports
    pub fn new(source: R, offset: u64) -> Self {
        Self {
            source,
            offset,
            state: ScanState::Scanning,
            residue: Vec::new(),
        }
    }

    /// Current scan state
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// File offset of the next unread segment
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes consumed from an incomplete segment, if the stream is corrupted
    pub fn residue(&self) -> &[u8] {
        &self.residue
    }

    /// Unconsumed part of the stream, preceded by any residue
    pub(crate) fn tail_mut(&mut self) -> (&[u8], &mut R) {
        (&self.residue, &mut self.source)
    }

    /// Unwrap the underlying stream
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Find the segment with `marker` whose payload starts with `vendor_magic`
    ///
    /// Checks `cache` first, then reads further segments from the stream
    /// (appending each to `cache`) until a match or the start of scan.
    ///
    /// Returns the cache index of the match.
    ///
    /// # Errors
    /// - `MarkerNotFound`: start of scan reached without a match
    /// - `CorruptedSegment`: stream ended inside a segment
    pub fn find_segment(
        &mut self,
        cache: &mut SegmentCache,
        marker: u16,
        vendor_magic: &[u8],
    ) -> Result<usize> {
        if let Some(index) = cache.find(marker, vendor_magic) {
            log::trace!("{} segment found in cache at {}", marker_label(marker), index);
            return Ok(index);
        }

        loop {
            match self.state {
                ScanState::Scanning => {}
                ScanState::Exhausted => return Err(Error::MarkerNotFound),
                ScanState::Corrupted => {
                    return Err(Error::CorruptedSegment {
                        offset: self.offset,
                        reason: "stream previously ended inside a segment".into(),
                    })
                }
            }

            let segment = self.next_segment()?;
            let segment_marker = segment.marker();
            let found = segment.matches(marker, vendor_magic);
            let index = cache.push(segment);

            if found {
                return Ok(index);
            }

            // there is no more metadata
            if segment_marker == SOS_MARKER {
                log::debug!("reached SOS without {} segment", marker_label(marker));
                self.state = ScanState::Exhausted;
                return Err(Error::MarkerNotFound);
            }
        }
    }

    /// Read one complete segment from the stream
    pub(crate) fn next_segment(&mut self) -> Result<Segment> {
        let mut bytes = Vec::with_capacity(2 * HEADER_SIZE);
        self.fill(&mut bytes, 2 * HEADER_SIZE)?;

        let length = BigEndian::read_u16(&bytes[HEADER_SIZE..2 * HEADER_SIZE]) as usize;
        if length < HEADER_SIZE {
            let reason = format!("length field {} is smaller than the field itself", length);
            return Err(self.corrupt(&mut bytes, reason));
        }
        self.fill(&mut bytes, HEADER_SIZE + length)?;

        let segment = Segment::from_raw(bytes);
        log::debug!(
            "{} segment at offset {} ({} bytes)",
            marker_label(segment.marker()),
            self.offset,
            segment.len()
        );
        self.offset += segment.len() as u64;
        Ok(segment)
    }

    /// Read until `bytes` holds `total` bytes
    fn fill(&mut self, bytes: &mut Vec<u8>, total: usize) -> Result<()> {
        let wanted = total - bytes.len();
        let result = self.source.by_ref().take(wanted as u64).read_to_end(bytes);
        match result {
            Ok(read) if read == wanted => Ok(()),
            Ok(_) => {
                let reason = format!(
                    "expected {} bytes, stream ended after {}",
                    total,
                    bytes.len()
                );
                Err(self.corrupt(bytes, reason))
            }
            Err(e) => {
                self.corrupt(bytes, e.to_string());
                Err(Error::Io(e))
            }
        }
    }

    /// Enter the corrupted state, keeping the consumed bytes for output
    fn corrupt(&mut self, bytes: &mut Vec<u8>, reason: String) -> Error {
        log::warn!("corrupted segment at offset {}: {}", self.offset, reason);
        self.state = ScanState::Corrupted;
        self.residue = std::mem::take(bytes);
        Error::CorruptedSegment {
            offset: self.offset,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    const VENDOR: &[u8] = &[0xFF, 0xE0];
    const SOS: &[u8] = &[0xFF, 0xDA, 0x00, 0x02];

    fn scanner(data: &[u8]) -> SegmentScanner<Cursor<Vec<u8>>> {
        SegmentScanner::new(Cursor::new(data.to_vec()), 2)
    }

    fn app0_then_sos() -> Vec<u8> {
        let mut data = vec![0xFF, 0xE0, 0x00, 0x04, 0xFF, 0xE0];
        data.extend_from_slice(SOS);
        data
    }

    #[test]
    fn test_found_in_cache() {
        let mut cache = SegmentCache::new();
        cache.push(Segment::from_raw(vec![0xFF, 0xE0, 0x00, 0x04, 0xFF, 0xE0]));

        // Empty stream: a cache hit must not touch it
        let mut scanner = scanner(&[]);
        assert_eq!(scanner.find_segment(&mut cache, 0xFFE0, VENDOR).unwrap(), 0);
        assert_eq!(scanner.state(), ScanState::Scanning);
    }

    #[test]
    fn test_found_in_stream() {
        let mut cache = SegmentCache::new();
        let mut scanner = scanner(&app0_then_sos());

        assert_eq!(scanner.find_segment(&mut cache, 0xFFE0, VENDOR).unwrap(), 0);
        assert_eq!(cache.len(), 1);
        // SOS not consumed
        assert_eq!(scanner.into_inner().position(), 6);
    }

    #[test]
    fn test_empty_stream_is_corrupted() {
        let mut cache = SegmentCache::new();
        let mut scanner = scanner(&[]);

        assert!(matches!(
            scanner.find_segment(&mut cache, 0xFFE0, VENDOR),
            Err(Error::CorruptedSegment { offset: 2, .. })
        ));
        assert_eq!(scanner.state(), ScanState::Corrupted);
    }

    #[test]
    fn test_short_segment_skipped_then_corrupted() {
        let mut cache = SegmentCache::new();
        let mut scanner = scanner(&[0xFF, 0xE0, 0x00, 0x03, 0xFF]);

        assert!(matches!(
            scanner.find_segment(&mut cache, 0xFFE0, VENDOR),
            Err(Error::CorruptedSegment { offset: 7, .. })
        ));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_wrong_marker() {
        let mut cache = SegmentCache::new();
        let mut scanner = scanner(&app0_then_sos());

        assert!(matches!(
            scanner.find_segment(&mut cache, 0xFFE1, VENDOR),
            Err(Error::MarkerNotFound)
        ));
        assert_eq!(cache.len(), 2);
        assert_eq!(scanner.state(), ScanState::Exhausted);
    }

    #[test]
    fn test_wrong_vendor() {
        let mut cache = SegmentCache::new();
        let mut scanner = scanner(&app0_then_sos());

        assert!(matches!(
            scanner.find_segment(&mut cache, 0xFFE0, &[0xFF, 0xE1]),
            Err(Error::MarkerNotFound)
        ));
    }

    #[test]
    fn test_stops_at_sos() {
        let mut data = SOS.to_vec();
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0xFF, 0xE0]);
        let mut cache = SegmentCache::new();
        let mut scanner = scanner(&data);

        assert!(matches!(
            scanner.find_segment(&mut cache, 0xFFE0, &[]),
            Err(Error::MarkerNotFound)
        ));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_exhausted_does_not_read_image_data() {
        let mut data = app0_then_sos();
        data.extend_from_slice(&[0xFF, 0xE1, 0x00, 0x04, 0xFF, 0xE0]);
        let mut cache = SegmentCache::new();
        let mut scanner = scanner(&data);

        assert!(scanner.find_segment(&mut cache, 0xFFE2, VENDOR).is_err());
        // Looks like an APP1 segment, but it is behind SOS
        assert!(matches!(
            scanner.find_segment(&mut cache, 0xFFE1, VENDOR),
            Err(Error::MarkerNotFound)
        ));
        assert_eq!(cache.len(), 2);
        // Cached segments are still found
        assert_eq!(scanner.find_segment(&mut cache, 0xFFE0, VENDOR).unwrap(), 0);
        assert_eq!(scanner.into_inner().position(), 10);
    }

    #[test]
    fn test_corruption_is_sticky_and_keeps_bytes() {
        let mut cache = SegmentCache::new();
        let mut scanner = scanner(&[0xFF, 0xE0, 0x00, 0x10, 0xAA, 0xBB]);

        assert!(scanner.find_segment(&mut cache, 0xFFE0, VENDOR).is_err());
        assert_eq!(scanner.residue(), &[0xFF, 0xE0, 0x00, 0x10, 0xAA, 0xBB]);
        assert!(matches!(
            scanner.find_segment(&mut cache, 0xFFE1, VENDOR),
            Err(Error::CorruptedSegment { .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_next_segment() {
        // Header only
        assert!(matches!(
            scanner(&[0xFF, 0xE0]).next_segment(),
            Err(Error::CorruptedSegment { .. })
        ));

        // Less than data size
        let mut small = vec![0u8; HEADER_SIZE + 10 - 1];
        BigEndian::write_u16(&mut small[HEADER_SIZE..2 * HEADER_SIZE], 10);
        assert!(matches!(
            scanner(&small).next_segment(),
            Err(Error::CorruptedSegment { .. })
        ));

        // Success
        let correct = [0xFF, 0xE0, 0x00, 0x03, 0xFF];
        let mut ok = scanner(&correct);
        let segment = ok.next_segment().unwrap();
        assert_eq!(segment.as_bytes(), &correct);
        assert_eq!(ok.offset(), 2 + 5);
    }

    #[test]
    fn test_impossible_length() {
        let mut scanner = scanner(&[0xFF, 0xE0, 0x00, 0x01, 0xAA]);
        match scanner.next_segment() {
            Err(Error::CorruptedSegment { offset, reason }) => {
                assert_eq!(offset, 2);
                assert!(reason.contains("length field 1"));
            }
            other => panic!("expected CorruptedSegment, got {:?}", other),
        }
    }

    #[test]
    fn test_io_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        }

        let mut cache = SegmentCache::new();
        let mut scanner = SegmentScanner::new(Broken, 2);
        assert!(matches!(
            scanner.find_segment(&mut cache, 0xFFE0, VENDOR),
            Err(Error::Io(_))
        ));
        assert_eq!(scanner.state(), ScanState::Corrupted);
    }
}
