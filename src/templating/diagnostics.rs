//! Diagnostics produced by the parser and the generator, and the routine
//! that drains them into the build log.

use std::path::{Path, PathBuf};

use crate::log::{BuildLog, LocatedMessage};

/// A single error or warning about a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Optional diagnostic code
    pub code: Option<String>,
    /// File the diagnostic refers to; `None` means "the template being processed"
    pub file: Option<PathBuf>,
    /// 1-based line, 0 when unknown
    pub line: usize,
    /// 1-based column, 0 when unknown
    pub column: usize,
    /// Message text
    pub message: String,
    /// Warnings are reported but never fail an item
    pub is_warning: bool,
}

impl Diagnostic {
    /// An error without location.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            file: None,
            line: 0,
            column: 0,
            message: message.into(),
            is_warning: false,
        }
    }

    /// A warning without location.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            is_warning: true,
            ..Self::error(message)
        }
    }

    /// Attach a line and column.
    #[must_use]
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    /// Attach a file.
    #[must_use]
    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach a code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// A mutable list of diagnostics owned by a parsed template or a generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Whether any non-warning diagnostic is present.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| !d.is_warning)
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Remove every diagnostic.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

/// Route every diagnostic in `diagnostics` to `log`, then clear the collection.
///
/// Diagnostics without a file are reported against `fallback_file`. Returns
/// `true` if at least one of them was an error. Calling it again on the
/// cleared collection logs nothing and returns `false`.
pub fn log_and_clear(
    log: &mut dyn BuildLog,
    diagnostics: &mut Diagnostics,
    fallback_file: &Path,
) -> bool {
    let mut has_errors = false;

    for diagnostic in diagnostics.items.drain(..) {
        let entry = LocatedMessage {
            code: diagnostic.code,
            file: diagnostic.file.unwrap_or_else(|| fallback_file.to_path_buf()),
            line: diagnostic.line,
            column: diagnostic.column,
            message: diagnostic.message,
        };

        if diagnostic.is_warning {
            log.warning_at(&entry);
        } else {
            has_errors = true;
            log.error_at(&entry);
        }
    }

    has_errors
}
