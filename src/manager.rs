//! JPEG metadata manager
//!
//! Owns one JPEG stream for the duration of an edit: the file prefix, the
//! segments scanned so far, and the unread rest of the stream. Lookups scan
//! lazily; nothing past the segment being looked for is read. The modified
//! file is produced by [`JpegMetaManager::compose_output`] as a reader that
//! chains the prefix, the cached segments and the untouched tail.

use crate::{
    codec::Fields,
    error::{Error, Result},
    media_type::{MediaType, MAGIC_PREFIX_LEN},
    scanner::{ScanState, SegmentScanner},
    segment::{marker_label, Segment, SegmentCache},
    vendor::{CodecVendor, VendorRegistry},
};
use std::io::{self, Read, Write};

/// Reads and updates vendor metadata segments of a JPEG stream
///
/// # Example
///
/// ```
/// use tinymeta_io::{test_utils::*, JpegMetaManager, VendorRegistry};
/// use std::io::{Cursor, Read};
///
/// # fn main() -> tinymeta_io::Result<()> {
/// let registry = VendorRegistry::builtin();
/// let input = Cursor::new(minimal_jpeg());
/// let mut manager = JpegMetaManager::new(&registry, input)?;
///
/// manager.upsert("tinymeta", &fields(&[("artist", "A")]))?;
/// let artist = manager.extract("tinymeta", &["artist"])?;
/// assert_eq!(artist["artist"], "A");
///
/// let mut output = Vec::new();
/// manager.compose_output().read_to_end(&mut output)?;
/// # Ok(())
/// # }
/// ```
pub struct JpegMetaManager<'r, R> {
    registry: &'r VendorRegistry,
    prefix: [u8; MAGIC_PREFIX_LEN],
    cache: SegmentCache,
    scanner: SegmentScanner<R>,
}

impl<'r, R: Read> JpegMetaManager<'r, R> {
    /// Read the file prefix from `source` and set up an empty segment cache
    ///
    /// # Errors
    /// - `UnsupportedFileType`: the stream does not start with the JPEG magic
    /// - `CorruptedSegment`: fewer than two bytes available
    pub fn new(registry: &'r VendorRegistry, mut source: R) -> Result<Self> {
        let mut prefix = [0u8; MAGIC_PREFIX_LEN];
        source.read_exact(&mut prefix).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::CorruptedSegment {
                offset: 0,
                reason: "stream too short for the file prefix".into(),
            },
            _ => Error::Io(e),
        })?;

        if MediaType::detect(&prefix) != Some(MediaType::Jpeg) {
            return Err(Error::UnsupportedFileType);
        }

        Ok(Self {
            registry,
            prefix,
            cache: SegmentCache::new(),
            scanner: SegmentScanner::new(source, MAGIC_PREFIX_LEN as u64),
        })
    }

    /// Add a new metadata segment for `vendor` right after the file prefix
    ///
    /// Existing segments of the same vendor are left in place; use
    /// [`upsert`](Self::upsert) to update them instead.
    ///
    /// # Errors
    /// - `VendorNotSupported`: `vendor` is not in the registry
    /// - `DataTooLarge`: encoded fields do not fit one segment
    pub fn insert(&mut self, vendor: &str, fields: &Fields) -> Result<()> {
        let registry = self.registry;
        let codec_vendor = registry.resolve(vendor)?;

        let encoded = codec_vendor.codec().encode(fields)?;
        let segment = Segment::build(
            codec_vendor.marker(),
            codec_vendor.vendor_magic(),
            &encoded,
        )?;

        log::debug!(
            "inserting {} segment for {} ({} bytes)",
            marker_label(segment.marker()),
            vendor,
            segment.len()
        );
        self.cache.prepend(segment);
        Ok(())
    }

    /// Merge `fields` into the metadata of `vendor`
    ///
    /// Fields with the same name are overwritten, other existing fields are
    /// kept. If the file has no segment for `vendor` yet, one is inserted.
    ///
    /// # Errors
    /// - `VendorNotSupported`: `vendor` is not in the registry
    /// - `DataTooLarge`: merged fields do not fit one segment; nothing is changed
    /// - `CorruptedSegment`, codec errors: propagated from scanning and decoding
    pub fn upsert(&mut self, vendor: &str, fields: &Fields) -> Result<()> {
        let registry = self.registry;
        let codec_vendor = registry.resolve(vendor)?;

        let index = match self.find_segment(codec_vendor) {
            Ok(index) => index,
            Err(Error::MarkerNotFound) => {
                log::debug!("no {} segment yet, inserting", vendor);
                return self.insert(vendor, fields);
            }
            Err(e) => return Err(e),
        };

        let Some(segment) = self.cache.get_mut(index) else {
            return Err(Error::MarkerNotFound);
        };
        let mut merged = decode_segment(codec_vendor, segment)?;
        merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));

        let encoded = codec_vendor.codec().encode(&merged)?;
        segment.replace_vendor_data(codec_vendor.vendor_magic(), &encoded)?;
        log::debug!(
            "updated {} segment for {} ({} fields)",
            marker_label(segment.marker()),
            vendor,
            merged.len()
        );
        Ok(())
    }

    /// Read the requested fields of `vendor`
    ///
    /// Names missing from the stored metadata are left out of the result;
    /// an empty `names` list yields an empty map.
    ///
    /// # Errors
    /// - `VendorNotSupported`: `vendor` is not in the registry
    /// - `MarkerNotFound`: the file has no segment for `vendor`
    /// - `CorruptedSegment`, codec errors: propagated from scanning and decoding
    pub fn extract<S: AsRef<str>>(&mut self, vendor: &str, names: &[S]) -> Result<Fields> {
        let registry = self.registry;
        let codec_vendor = registry.resolve(vendor)?;

        let index = self.find_segment(codec_vendor)?;
        let Some(segment) = self.cache.get(index) else {
            return Err(Error::MarkerNotFound);
        };
        let mut decoded = decode_segment(codec_vendor, segment)?;

        Ok(names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                decoded.remove_entry(name)
            })
            .collect())
    }

    /// Reader over the complete (possibly modified) file
    ///
    /// Yields the prefix, every cached segment in order, then the unread rest
    /// of the stream. It shares the stream cursor with the manager, so it must
    /// be read to the end before the manager is used again.
    pub fn compose_output(&mut self) -> ComposedReader<'_, R> {
        let (residue, tail) = self.scanner.tail_mut();

        let mut chunks = Vec::with_capacity(self.cache.len() + 2);
        chunks.push(&self.prefix[..]);
        chunks.extend(self.cache.iter().map(Segment::as_bytes));
        if !residue.is_empty() {
            chunks.push(residue);
        }

        ComposedReader {
            chunks: chunks.into_iter(),
            current: &[],
            tail,
        }
    }

    /// Copy [`compose_output`](Self::compose_output) into `writer`
    ///
    /// Returns the number of bytes written.
    pub fn write_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64> {
        Ok(io::copy(&mut self.compose_output(), writer)?)
    }

    /// The file prefix (JPEG magic)
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Segments known so far, in output order
    pub fn segments(&self) -> &SegmentCache {
        &self.cache
    }

    /// How far scanning has progressed
    pub fn scan_state(&self) -> ScanState {
        self.scanner.state()
    }

    fn find_segment(&mut self, codec_vendor: &CodecVendor) -> Result<usize> {
        self.scanner.find_segment(
            &mut self.cache,
            codec_vendor.marker(),
            codec_vendor.vendor_magic(),
        )
    }
}

/// Decode the fields stored in `segment`; a segment holding only the vendor magic has none
fn decode_segment(codec_vendor: &CodecVendor, segment: &Segment) -> Result<Fields> {
    let data = segment.vendor_data(codec_vendor.vendor_magic());
    if data.is_empty() {
        return Ok(Fields::new());
    }
    codec_vendor.codec().decode(data)
}

/// Sequential reader over byte chunks followed by the rest of a stream
///
/// Returned by [`JpegMetaManager::compose_output`].
pub struct ComposedReader<'a, R> {
    chunks: std::vec::IntoIter<&'a [u8]>,
    current: &'a [u8],
    tail: &'a mut R,
}

impl<R: Read> Read for ComposedReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if !self.current.is_empty() {
                return self.current.read(buf);
            }
            match self.chunks.next() {
                Some(chunk) => self.current = chunk,
                None => return self.tail.read(buf),
            }
        }
    }
}
