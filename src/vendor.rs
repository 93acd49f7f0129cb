//! Vendor codec registry
//!
//! Maps a vendor identifier (as given on the command line, e.g. `tinymeta`)
//! to the codec that reads its payload, the application marker its segment
//! lives under, and the vendor magic that prefixes the payload.

use crate::{
    codec::{MetaCodec, TinyMeta},
    error::{Error, Result},
    segment::{is_app_marker, marker_label},
};
use std::collections::HashMap;
use std::fmt;

/// Vendor identifier of the plain JSON codec
pub const TINYMETA_VENDOR: &str = "tinymeta";

/// Vendor identifier of the gzip JSON codec
#[cfg(feature = "gzip")]
pub const TINYMETA_GZIP_VENDOR: &str = "tinymetagzip";

/// Codec, marker and vendor magic for one vendor
pub struct CodecVendor {
    codec: Box<dyn MetaCodec>,
    marker: u16,
    vendor_magic: Vec<u8>,
}

impl CodecVendor {
    /// Create a vendor entry whose magic is `name` followed by a NUL terminator
    ///
    /// # Errors
    /// - `InvalidMarker`: `marker` is not an application marker (0xFFE0..=0xFFEF)
    pub fn new(codec: impl MetaCodec + 'static, marker: u16, name: &str) -> Result<Self> {
        let mut vendor_magic = Vec::with_capacity(name.len() + 1);
        vendor_magic.extend_from_slice(name.as_bytes());
        vendor_magic.push(0);
        Self::with_magic(codec, marker, vendor_magic)
    }

    /// Create a vendor entry with raw vendor magic bytes
    pub fn with_magic(
        codec: impl MetaCodec + 'static,
        marker: u16,
        vendor_magic: Vec<u8>,
    ) -> Result<Self> {
        if !is_app_marker(marker) {
            return Err(Error::InvalidMarker(marker));
        }
        Ok(Self {
            codec: Box::new(codec),
            marker,
            vendor_magic,
        })
    }

    /// Codec for the payload
    pub fn codec(&self) -> &dyn MetaCodec {
        self.codec.as_ref()
    }

    /// Application marker of the segment
    pub fn marker(&self) -> u16 {
        self.marker
    }

    /// Magic bytes at the start of the payload, terminator included
    pub fn vendor_magic(&self) -> &[u8] {
        &self.vendor_magic
    }
}

impl fmt::Debug for CodecVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecVendor")
            .field("codec", &self.codec.name())
            .field("marker", &marker_label(self.marker))
            .field("vendor_magic", &String::from_utf8_lossy(&self.vendor_magic))
            .finish()
    }
}

/// Supported vendors, built once and shared by every manager
#[derive(Debug, Default)]
pub struct VendorRegistry {
    vendors: HashMap<String, CodecVendor>,
}

impl VendorRegistry {
    /// Create a registry with no vendors
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create the registry of built-in vendors
    ///
    /// - `tinymeta`: plain JSON in APP0
    /// - `tinymetagzip`: gzip JSON in APP1 (feature `gzip`)
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.vendors.insert(
            TINYMETA_VENDOR.to_string(),
            CodecVendor {
                codec: Box::new(TinyMeta),
                marker: 0xFFE0,
                vendor_magic: b"tinymeta\0".to_vec(),
            },
        );
        #[cfg(feature = "gzip")]
        registry.vendors.insert(
            TINYMETA_GZIP_VENDOR.to_string(),
            CodecVendor {
                codec: Box::new(crate::codec::TinyMetaGzip),
                marker: 0xFFE1,
                vendor_magic: b"tinymetagzip\0".to_vec(),
            },
        );
        registry
    }

    /// Add or replace a vendor
    pub fn with_vendor(mut self, id: impl Into<String>, vendor: CodecVendor) -> Self {
        self.vendors.insert(id.into(), vendor);
        self
    }

    /// Look up a vendor by identifier
    ///
    /// # Errors
    /// - `VendorNotSupported`: `id` is not registered
    pub fn resolve(&self, id: &str) -> Result<&CodecVendor> {
        self.vendors
            .get(id)
            .ok_or_else(|| Error::VendorNotSupported(id.to_string()))
    }

    /// Registered vendor identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.vendors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
