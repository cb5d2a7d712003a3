//! Error handling for ttbuild
//!
//! Two kinds of failure exist in ttbuild and they are handled differently:
//!
//! - **Item-level failures** (a missing template, a parse error, an unwritable
//!   output) never surface as Rust errors. They are logged through the
//!   [`BuildLog`](crate::log::BuildLog) and folded into the run result.
//! - **Run-level failures** (unreadable configuration, a corrupt state file,
//!   a malformed `--param`) stop the command before any template is touched.
//!   Those are represented by [`TtError`] and shown to the user through
//!   [`ErrorContext`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use ttbuild::core::{user_friendly_error, TtError};
//!
//! fn load() -> anyhow::Result<()> {
//!     Err(TtError::ConfigNotFound {
//!         path: "ttbuild.toml".to_string(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = load() {
//!     user_friendly_error(e).display();
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use super::file_error::FileOperationError;

/// The main error type for ttbuild run-level failures
#[derive(Error, Debug, Clone)]
pub enum TtError {
    /// The build configuration file could not be found
    #[error("Build configuration not found: {path}")]
    ConfigNotFound {
        /// Path that was probed
        path: String,
    },

    /// The build configuration file is not valid TOML or has the wrong shape
    #[error("Invalid build configuration in {file}: {reason}")]
    ConfigParseError {
        /// Configuration file
        file: String,
        /// Parser message
        reason: String,
    },

    /// A transform glob pattern could not be parsed or expanded
    #[error("Invalid input pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        reason: String,
    },

    /// The persisted build state could not be parsed
    #[error("Invalid build state in {file}: {reason}")]
    StateParseError {
        /// State file
        file: String,
        /// Parser message
        reason: String,
    },

    /// The persisted build state was written by a newer ttbuild
    #[error("Build state version {found} is newer than supported version {supported}")]
    StateVersionMismatch {
        /// Version found in the file
        found: u32,
        /// Highest version this build understands
        supported: u32,
    },

    /// A `--param` argument was not of the form `NAME=VALUE`
    #[error("Invalid parameter '{argument}': expected NAME=VALUE")]
    InvalidParameterArgument {
        /// The raw argument
        argument: String,
    },

    /// A file system operation outside of item processing failed
    #[error("File system error during {operation}: {path}")]
    FileSystemError {
        /// What was being done
        operation: String,
        /// Path involved
        path: String,
    },

    /// Catch-all for messages that don't fit another variant
    #[error("{message}")]
    Other {
        /// Message shown to the user
        message: String,
    },
}

impl From<&FileOperationError> for TtError {
    fn from(error: &FileOperationError) -> Self {
        TtError::FileSystemError {
            operation: error.operation.to_string(),
            path: error.file_path.display().to_string(),
        }
    }
}

/// A [`TtError`] paired with optional details and a suggestion for the user
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: TtError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details
    #[must_use]
    pub const fn new(error: TtError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

fn create_error_context(error: &TtError) -> ErrorContext {
    let context = ErrorContext::new(error.clone());
    match error {
        TtError::ConfigNotFound {
            ..
        } => context
            .with_suggestion("Create a ttbuild.toml next to your templates or pass --config")
            .with_details("ttbuild reads its inputs, parameters and namespaces from ttbuild.toml"),
        TtError::ConfigParseError {
            ..
        } => context.with_suggestion(
            "Check the TOML syntax in your ttbuild.toml file. Verify quotes, brackets, and table names",
        ),
        TtError::InvalidPattern {
            ..
        } => context.with_suggestion("Use glob syntax such as 'templates/**/*.tt'"),
        TtError::StateParseError {
            ..
        } => context
            .with_suggestion("Delete the state file or run 'ttbuild build --force' to rebuild everything")
            .with_details("The state file records the previous build and is safe to regenerate"),
        TtError::StateVersionMismatch {
            ..
        } => context.with_suggestion("Update ttbuild or delete the state file"),
        TtError::InvalidParameterArgument {
            ..
        } => context.with_suggestion("Pass parameters as --param Count=42"),
        TtError::FileSystemError {
            ..
        }
        | TtError::Other {
            ..
        } => context,
    }
}

/// Convert any error into an [`ErrorContext`] suitable for CLI display.
///
/// Walks the error chain looking for a [`TtError`] or a
/// [`FileOperationError`]; anything else is wrapped as [`TtError::Other`].
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(tt_error) = cause.downcast_ref::<TtError>() {
            return create_error_context(tt_error);
        }

        if let Some(file_error) = cause.downcast_ref::<FileOperationError>() {
            return ErrorContext::new(TtError::from(file_error))
                .with_details(file_error.user_message());
        }

        if let Some(toml_error) = cause.downcast_ref::<toml::de::Error>() {
            return create_error_context(&TtError::ConfigParseError {
                file: "ttbuild.toml".to_string(),
                reason: toml_error.to_string(),
            });
        }
    }

    ErrorContext::new(TtError::Other {
        message: format!("{error:#}"),
    })
}
