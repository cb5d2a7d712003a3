//! Core error types shared across ttbuild.
//!
//! - [`error`] - run-level errors ([`TtError`]) and CLI presentation ([`ErrorContext`])
//! - [`file_error`] - file operation errors carrying path and purpose

pub mod error;
pub mod file_error;

pub use error::{ErrorContext, TtError, user_friendly_error};
pub use file_error::{FileOperation, FileOperationContext, FileOperationError, FileResultExt};
