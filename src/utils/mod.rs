//! Supporting utilities
//!
//! - [`fs`] - the [`FileSystem`](fs::FileSystem) seam, atomic writes and the
//!   per-run [`WriteTimeCache`](fs::WriteTimeCache)

pub mod fs;

pub use fs::{FileSystem, LiveFileSystem, WriteTimeCache, atomic_write};
