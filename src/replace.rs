//! Atomic file replacement

use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace the file at `path` with everything read from `source`
///
/// The data is written to a temporary file in the same directory which is
/// then renamed over `path`, so readers see either the old or the new file.
/// Permissions of an existing file are carried over. If anything fails the
/// temporary file is removed and `path` is untouched.
///
/// `source` may read from `path` itself; the original is only replaced after
/// `source` is exhausted.
///
/// Returns the number of bytes written.
pub fn replace_file<R: Read + ?Sized>(source: &mut R, path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    let written = io::copy(source, &mut temp)?;
    temp.flush()?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    log::debug!("replaced {} ({} bytes)", path.display(), written);
    Ok(written)
}
