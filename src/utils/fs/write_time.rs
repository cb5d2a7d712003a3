//! Per-run memoization of file modification times.
//!
//! The staleness check probes the same paths repeatedly (a shared include is
//! a dependency of many templates). The cache answers every probe after the
//! first from memory, which also makes the answers stable for the rest of the
//! run: once a path has been looked up, later changes on disk are not seen
//! until the next run builds a fresh cache.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::FileSystem;

/// Memoized modification-time lookups for one run.
///
/// A file that does not exist is reported as `None` ("never written") so
/// that comparisons against it always treat the item as stale.
pub struct WriteTimeCache<F: FileSystem> {
    fs: F,
    cache: HashMap<PathBuf, Option<SystemTime>>,
    hits: usize,
    misses: usize,
}

impl<F: FileSystem> WriteTimeCache<F> {
    /// Create an empty cache probing through `fs`.
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Last modification time of `path`, or `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns the probe error for failures other than "not found". Failed
    /// probes are not cached.
    pub fn write_time(&mut self, path: &Path) -> io::Result<Option<SystemTime>> {
        let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        if let Some(value) = self.cache.get(&key) {
            self.hits += 1;
            return Ok(*value);
        }

        self.misses += 1;
        let value = match self.fs.modified(&key) {
            Ok(time) => Some(time),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        self.cache.insert(key, value);
        Ok(value)
    }

    /// Cache statistics as `(hits, misses)`.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}
