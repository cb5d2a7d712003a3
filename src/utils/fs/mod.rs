//! File system access for template processing.
//!
//! Everything ttbuild does to the disk while processing templates goes
//! through the [`FileSystem`] trait: existence checks, reading template
//! sources, writing outputs and probing modification times. The live
//! implementation, [`LiveFileSystem`], is backed by `std::fs` and writes
//! outputs atomically (temp file in the destination directory, then rename)
//! so an interrupted build never leaves a half-written output behind.
//!
//! Modification-time probes are memoized per run by [`WriteTimeCache`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use ttbuild::utils::fs::{FileSystem, LiveFileSystem};
//!
//! # fn example() -> std::io::Result<()> {
//! let fs = LiveFileSystem;
//! if fs.exists(Path::new("greeting.tt")) {
//!     let text = fs.read_to_string(Path::new("greeting.tt"))?;
//!     fs.write(Path::new("greeting.txt"), text.as_bytes())?;
//! }
//! # Ok(())
//! # }
//! ```

mod atomic;
mod write_time;

pub use atomic::atomic_write;
pub use write_time::WriteTimeCache;

use std::io;
use std::path::Path;
use std::time::SystemTime;

/// File system primitives consumed by the processor and the staleness check.
///
/// All fallible operations return the raw [`io::Error`]; callers attach
/// operation context with
/// [`FileResultExt`](crate::core::FileResultExt) at the point where they know
/// why the file was being accessed.
pub trait FileSystem {
    /// Returns `true` if the path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Reads the entire contents of a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Writes bytes to a file, creating parent directories as needed and
    /// replacing any previous content.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Returns the last modification time of a file.
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        (**self).write(path, contents)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        (**self).modified(path)
    }
}

/// File system adapter backed by real disk I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        atomic_write(path, contents)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }
}
