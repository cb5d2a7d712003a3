//! Test utilities for ttbuild
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`init_test_logging`] installs a tracing subscriber once per process
//! - [`CountingFileSystem`] counts file system calls so tests can assert that
//!   an up-to-date build performs no reads or writes
//! - [`error_messages`] flattens a [`RecordingBuildLog`]'s errors to text

use std::cell::Cell;
use std::io;
use std::path::Path;
use std::sync::Once;
use std::time::SystemTime;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::log::{LogEntry, RecordingBuildLog};
use crate::utils::fs::{FileSystem, LiveFileSystem};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=ttbuild=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// [`LiveFileSystem`] wrapper that counts calls.
#[derive(Debug, Default)]
pub struct CountingFileSystem {
    inner: LiveFileSystem,
    exists: Cell<usize>,
    reads: Cell<usize>,
    writes: Cell<usize>,
    probes: Cell<usize>,
}

impl CountingFileSystem {
    /// Create a wrapper with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of existence checks.
    pub fn exists_checks(&self) -> usize {
        self.exists.get()
    }

    /// Number of reads.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Number of writes.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Number of modification-time probes.
    pub fn probes(&self) -> usize {
        self.probes.get()
    }
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl FileSystem for CountingFileSystem {
    fn exists(&self, path: &Path) -> bool {
        bump(&self.exists);
        self.inner.exists(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        bump(&self.reads);
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        bump(&self.writes);
        self.inner.write(path, contents)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        bump(&self.probes);
        self.inner.modified(path)
    }
}

/// Every error in `log`, rendered as text.
pub fn error_messages(log: &RecordingBuildLog) -> Vec<String> {
    log.errors()
        .into_iter()
        .map(|entry| match entry {
            LogEntry::Error(message) => message.clone(),
            LogEntry::FileError {
                message,
                ..
            } => message.clone(),
            LogEntry::LocatedError(located) | LogEntry::Warning(located) => located.to_string(),
        })
        .collect()
}
