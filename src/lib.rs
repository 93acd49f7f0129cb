//! Streaming read/update of vendor key/value metadata embedded in JPEG files.
//!
//! Metadata lives in a JPEG application segment (APP0..APP15) whose payload
//! starts with a NUL-terminated vendor magic, followed by the fields encoded
//! by that vendor's codec (plain JSON, or gzip-compressed JSON). Image data
//! is never decoded: segments are located by marker and vendor magic, and
//! everything else is copied through as opaque bytes.
//!
//! # Design Principles
//!
//! - **Lazy scanning**: segments are read only as far as a lookup needs,
//!   and never past the start of scan
//! - **Read once**: every scanned segment is cached, so a read followed by a
//!   write in the same session never re-reads the stream
//! - **Streaming output**: the modified file is a reader chaining the prefix,
//!   the cached segments and the unread tail; the file is never buffered whole
//!
//! # Quick Start
//!
//! ```
//! use tinymeta_io::{test_utils::*, JpegMetaManager, VendorRegistry};
//! use std::io::Cursor;
//!
//! # fn main() -> tinymeta_io::Result<()> {
//! // Built once, shared by every file
//! let registry = VendorRegistry::builtin();
//!
//! let mut manager = JpegMetaManager::new(&registry, Cursor::new(minimal_jpeg()))?;
//! manager.upsert("tinymeta", &fields(&[("artist", "A"), ("title", "T")]))?;
//!
//! let mut output = Vec::new();
//! manager.write_to(&mut output)?;
//!
//! let mut reread = JpegMetaManager::new(&registry, Cursor::new(output))?;
//! let found = reread.extract("tinymeta", &["artist"])?;
//! assert_eq!(found["artist"], "A");
//! # Ok(())
//! # }
//! ```
//!
//! # Updating Files In Place
//!
//! ```no_run
//! use tinymeta_io::{replace_file, Fields, JpegMetaManager, MediaType, VendorRegistry};
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> tinymeta_io::Result<()> {
//! let registry = VendorRegistry::builtin();
//! let (media_type, source) = MediaType::sniff(BufReader::new(File::open("photo.jpg")?))?;
//! assert_eq!(media_type, MediaType::Jpeg);
//!
//! let mut manager = JpegMetaManager::new(&registry, source)?;
//! let mut fields = Fields::new();
//! fields.insert("artist".into(), "A".into());
//! manager.upsert("tinymetagzip", &fields)?;
//!
//! replace_file(&mut manager.compose_output(), "photo.jpg")?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
mod error;
mod manager;
mod media_type;
mod replace;
mod request;
pub mod scanner;
pub mod segment;
pub mod vendor;

pub use codec::{Fields, MetaCodec};
pub use error::{Error, Result};
pub use manager::{ComposedReader, JpegMetaManager};
pub use media_type::{MediaType, SniffedReader, JPEG_MAGIC, MAGIC_PREFIX_LEN};
pub use replace::replace_file;
pub use request::MetaRequest;
pub use scanner::{ScanState, SegmentScanner};
pub use segment::{Segment, SegmentCache, DATA_MAX_SIZE};
pub use vendor::{CodecVendor, VendorRegistry, TINYMETA_VENDOR};

#[cfg(feature = "gzip")]
pub use vendor::TINYMETA_GZIP_VENDOR;

// Test utilities - only compiled for tests or when explicitly enabled
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
