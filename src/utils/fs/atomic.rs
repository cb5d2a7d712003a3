//! Atomic file write operations using temp-and-rename strategy.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Writes `content` to `path` atomically.
///
/// The data is written to a temporary file in the destination directory,
/// synced, and renamed over the target, so readers observe either the old
/// file or the complete new one. Parent directories are created if needed.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory cannot be created, the
/// temporary file cannot be written, or the rename fails (for example when
/// `path` is an existing directory).
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // The temp file is removed when the PersistError drops.
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
