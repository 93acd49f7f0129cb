//! Media type detection
//!
//! Identifies a file from its leading magic bytes. Only JPEG carries the
//! metadata segments this crate manages, so it is the only type detected.

use crate::error::{Error, Result};
use std::io::{Chain, Cursor, Read};

/// Number of leading bytes needed to tell supported types apart
pub const MAGIC_PREFIX_LEN: usize = 2;

/// JPEG Start of Image
pub const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// Reader that replays sniffed magic bytes before the rest of the stream
pub type SniffedReader<R> = Chain<Cursor<Vec<u8>>, R>;

/// Specific media type - what the content represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Standard JPEG image
    Jpeg,
}

impl MediaType {
    /// Get all media types that are available in this build
    pub fn all() -> &'static [MediaType] {
        &[MediaType::Jpeg]
    }

    /// Magic bytes a file of this type starts with
    pub fn magic(&self) -> &'static [u8] {
        match self {
            MediaType::Jpeg => &JPEG_MAGIC,
        }
    }

    /// Detect the media type from the first bytes of a file
    ///
    /// # Example
    ///
    /// ```
    /// use tinymeta_io::MediaType;
    ///
    /// assert_eq!(MediaType::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(MediaType::Jpeg));
    /// assert_eq!(MediaType::detect(b"GIF8"), None);
    /// ```
    pub fn detect(header: &[u8]) -> Option<MediaType> {
        Self::all()
            .iter()
            .copied()
            .find(|media_type| header.starts_with(media_type.magic()))
    }

    /// Read the magic prefix of `source` and detect its media type
    ///
    /// Returns the media type together with a reader yielding the complete
    /// stream again, prefix included.
    ///
    /// # Errors
    /// - `UnsupportedFileType`: unknown magic, or the stream is shorter than the magic
    /// - `Io`: reading the prefix failed
    pub fn sniff<R: Read>(mut source: R) -> Result<(MediaType, SniffedReader<R>)> {
        let mut prefix = Vec::with_capacity(MAGIC_PREFIX_LEN);
        source
            .by_ref()
            .take(MAGIC_PREFIX_LEN as u64)
            .read_to_end(&mut prefix)?;

        let media_type = Self::detect(&prefix).ok_or(Error::UnsupportedFileType)?;
        Ok((media_type, Cursor::new(prefix).chain(source)))
    }

    /// Get the primary MIME type for this media type
    pub fn to_mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
        }
    }

    /// Get the primary file extension for this media type (without dot)
    pub fn to_extension(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_mime())
    }
}
