//! Build log sink.
//!
//! The processor reports everything the user needs to see about individual
//! templates (missing inputs, I/O failures, parser and engine diagnostics)
//! through a [`BuildLog`]. Calls are fire-and-forget: nothing the log does
//! feeds back into processing.
//!
//! Two implementations ship with the crate:
//! - [`TracingBuildLog`] emits `tracing` events and keeps counts for the CLI
//!   summary
//! - [`RecordingBuildLog`] keeps every entry in memory for inspection

use std::fmt;
use std::path::PathBuf;

use crate::core::FileOperationError;

/// A message tied to a location in a template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedMessage {
    /// Diagnostic code, if the producer assigned one
    pub code: Option<String>,
    /// File the message refers to
    pub file: PathBuf,
    /// 1-based line, 0 when unknown
    pub line: usize,
    /// 1-based column, 0 when unknown
    pub column: usize,
    /// Message text
    pub message: String,
}

impl fmt::Display for LocatedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if self.line > 0 {
            write!(f, "({},{})", self.line, self.column)?;
        }
        write!(f, ": ")?;
        if let Some(code) = &self.code {
            write!(f, "{code}: ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// Destination for build messages.
pub trait BuildLog {
    /// Log a free-form error.
    fn error(&mut self, message: &str);

    /// Log a failed file operation against the file it concerned.
    fn error_from_file_operation(&mut self, error: &FileOperationError);

    /// Log a warning with location.
    fn warning_at(&mut self, entry: &LocatedMessage);

    /// Log an error with location.
    fn error_at(&mut self, entry: &LocatedMessage);
}

/// Build log that forwards to `tracing`.
#[derive(Debug, Default)]
pub struct TracingBuildLog {
    errors: usize,
    warnings: usize,
}

impl TracingBuildLog {
    /// Create a log with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of errors logged so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Number of warnings logged so far.
    pub fn warning_count(&self) -> usize {
        self.warnings
    }
}

impl BuildLog for TracingBuildLog {
    fn error(&mut self, message: &str) {
        self.errors += 1;
        tracing::error!("{message}");
    }

    fn error_from_file_operation(&mut self, error: &FileOperationError) {
        self.errors += 1;
        tracing::error!(file = %error.file_path.display(), "{}", error.user_message());
    }

    fn warning_at(&mut self, entry: &LocatedMessage) {
        self.warnings += 1;
        tracing::warn!(
            file = %entry.file.display(),
            line = entry.line,
            column = entry.column,
            code = entry.code.as_deref().unwrap_or(""),
            "{entry}"
        );
    }

    fn error_at(&mut self, entry: &LocatedMessage) {
        self.errors += 1;
        tracing::error!(
            file = %entry.file.display(),
            line = entry.line,
            column = entry.column,
            code = entry.code.as_deref().unwrap_or(""),
            "{entry}"
        );
    }
}

/// One entry captured by [`RecordingBuildLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// From [`BuildLog::error`]
    Error(String),
    /// From [`BuildLog::error_from_file_operation`]
    FileError {
        /// File the operation concerned
        file: PathBuf,
        /// Rendered message
        message: String,
    },
    /// From [`BuildLog::warning_at`]
    Warning(LocatedMessage),
    /// From [`BuildLog::error_at`]
    LocatedError(LocatedMessage),
}

impl LogEntry {
    /// Whether the entry is an error of any kind.
    pub fn is_error(&self) -> bool {
        !matches!(self, LogEntry::Warning(_))
    }
}

/// Build log that keeps entries in memory.
#[derive(Debug, Default)]
pub struct RecordingBuildLog {
    /// Entries in the order they were logged
    pub entries: Vec<LogEntry>,
}

impl RecordingBuildLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All error entries.
    pub fn errors(&self) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.is_error()).collect()
    }

    /// All warning entries.
    pub fn warnings(&self) -> Vec<&LocatedMessage> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                LogEntry::Warning(w) => Some(w),
                _ => None,
            })
            .collect()
    }
}

impl BuildLog for RecordingBuildLog {
    fn error(&mut self, message: &str) {
        self.entries.push(LogEntry::Error(message.to_string()));
    }

    fn error_from_file_operation(&mut self, error: &FileOperationError) {
        self.entries.push(LogEntry::FileError {
            file: error.file_path.clone(),
            message: error.user_message(),
        });
    }

    fn warning_at(&mut self, entry: &LocatedMessage) {
        self.entries.push(LogEntry::Warning(entry.clone()));
    }

    fn error_at(&mut self, entry: &LocatedMessage) {
        self.entries.push(LogEntry::LocatedError(entry.clone()));
    }
}
