//! Template directive parser.
//!
//! A template is plain text with directives embedded as
//! `<#@ name attr="value" #>`. The parser pulls the directives out, keeps the
//! remaining text as the body, and inlines `include` directives. Everything
//! else about the body is left to the generator.
//!
//! ```text
//! <#@ template language="Rust" #>
//! <#@ parameter name="Count" type="int" #>
//! There are {{ Count }} items.
//! ```
//!
//! A line break directly after a directive's closing `#>` belongs to the
//! directive, so the example above renders to a single line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::MAX_INCLUDE_DEPTH;
use crate::core::{FileOperation, FileResultExt};
use crate::utils::fs::FileSystem;

use super::diagnostics::{Diagnostic, Diagnostics};

const DIRECTIVE_OPEN: &str = "<#@";
const DIRECTIVE_CLOSE: &str = "#>";

/// A directive found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive name, lowercase
    pub name: String,
    /// Attributes keyed by lowercase name
    pub attributes: BTreeMap<String, String>,
    /// File the directive came from when it was pulled in by an include
    pub file: Option<PathBuf>,
    /// 1-based line of the `<#@`
    pub line: usize,
    /// 1-based column of the `<#@`
    pub column: usize,
}

impl Directive {
    /// Attribute value by (case-insensitive) name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// A diagnostic located at this directive.
    pub fn diagnostic(&self, diagnostic: Diagnostic) -> Diagnostic {
        let diagnostic = diagnostic.at(self.line, self.column);
        match &self.file {
            Some(file) => diagnostic.in_file(file),
            None => diagnostic,
        }
    }
}

/// Where a line of the body came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Included file, or `None` for the template itself
    pub file: Option<PathBuf>,
    /// 1-based line in that file
    pub line: usize,
}

/// In-memory form of one template.
#[derive(Debug, Clone, Default)]
pub struct ParsedTemplate {
    /// Directives in source order, includes expanded in place
    pub directives: Vec<Directive>,
    /// Template text with directives removed
    pub body: String,
    /// Files pulled in through `include`, in first-seen order
    pub dependencies: Vec<PathBuf>,
    /// Diagnostics raised while parsing and deriving settings
    pub errors: Diagnostics,
    line_map: Vec<SourceLine>,
}

impl ParsedTemplate {
    /// All directives with the given name.
    pub fn directives_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> {
        self.directives.iter().filter(move |d| d.name == name)
    }

    /// The first `parameter` directive declaring `name`.
    pub fn find_parameter(&self, name: &str) -> Option<&Directive> {
        self.directives_named("parameter").find(|d| d.attribute("name") == Some(name))
    }

    /// Map a 1-based body line back to its source.
    pub fn source_line(&self, body_line: usize) -> Option<&SourceLine> {
        body_line.checked_sub(1).and_then(|index| self.line_map.get(index))
    }
}

/// Loads the text of included files.
pub trait IncludeResolver {
    /// Resolve `file` as written in an include directive of `from`.
    ///
    /// Returns the resolved path and its text, or a diagnostic describing why
    /// it could not be loaded.
    fn resolve(&mut self, file: &str, from: &Path) -> Result<(PathBuf, String), Diagnostic>;
}

/// Resolves includes next to the including file, then on the include paths.
pub struct FileIncludeResolver<'a, F: FileSystem> {
    fs: &'a F,
    include_paths: &'a [PathBuf],
}

impl<'a, F: FileSystem> FileIncludeResolver<'a, F> {
    /// Create a resolver searching `include_paths` after the including file's directory.
    pub fn new(fs: &'a F, include_paths: &'a [PathBuf]) -> Self {
        Self {
            fs,
            include_paths,
        }
    }
}

impl<F: FileSystem> IncludeResolver for FileIncludeResolver<'_, F> {
    fn resolve(&mut self, file: &str, from: &Path) -> Result<(PathBuf, String), Diagnostic> {
        let requested = Path::new(file);
        let local_dir = from.parent().map(Path::to_path_buf).unwrap_or_default();

        let candidates = std::iter::once(local_dir)
            .chain(self.include_paths.iter().cloned())
            .map(|dir| dir.join(requested));

        for candidate in candidates {
            if !self.fs.exists(&candidate) {
                continue;
            }
            return self
                .fs
                .read_to_string(&candidate)
                .with_file_context(
                    FileOperation::Read,
                    &candidate,
                    "loading include file",
                    "templating::directives::resolve",
                )
                .map(|text| (candidate, text))
                .map_err(|e| Diagnostic::error(e.user_message()));
        }

        Err(Diagnostic::error(format!("Could not find include file '{file}'")))
    }
}

/// Parse `text` (the contents of `input`) into a [`ParsedTemplate`].
pub fn parse_template(
    text: &str,
    input: &Path,
    includes: &mut dyn IncludeResolver,
) -> ParsedTemplate {
    let mut parser = Parser {
        includes,
        template: ParsedTemplate::default(),
        at_line_start: true,
        include_stack: vec![input.to_path_buf()],
    };
    parser.parse_text(text, None, input);
    parser.template
}

struct Parser<'r> {
    includes: &'r mut dyn IncludeResolver,
    template: ParsedTemplate,
    at_line_start: bool,
    include_stack: Vec<PathBuf>,
}

/// Byte offset → (line, column) lookup for one source text.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            starts,
        }
    }

    fn locate(&self, text: &str, offset: usize) -> (usize, usize) {
        let line_index = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.starts[line_index];
        let column = text[line_start..offset].chars().count() + 1;
        (line_index + 1, column)
    }
}

impl Parser<'_> {
    fn parse_text(&mut self, text: &str, file: Option<&Path>, origin: &Path) {
        let index = LineIndex::new(text);
        let mut pos = 0;

        while let Some(found) = text[pos..].find(DIRECTIVE_OPEN) {
            let start = pos + found;
            self.append_body(&text[pos..start], pos, text, &index, file);

            let (line, column) = index.locate(text, start);
            let content_start = start + DIRECTIVE_OPEN.len();
            let Some(close) = text[content_start..].find(DIRECTIVE_CLOSE) else {
                self.push_error(Diagnostic::error("Unterminated directive: missing '#>'"), file, line, column);
                return;
            };
            let content_end = content_start + close;
            pos = content_end + DIRECTIVE_CLOSE.len();

            if text[pos..].starts_with("\r\n") {
                pos += 2;
            } else if text[pos..].starts_with('\n') {
                pos += 1;
            }

            match parse_directive(&text[content_start..content_end]) {
                Ok((name, attributes)) => {
                    let directive = Directive {
                        name,
                        attributes,
                        file: file.map(Path::to_path_buf),
                        line,
                        column,
                    };
                    let include = (directive.name == "include").then(|| directive.clone());
                    self.template.directives.push(directive);
                    if let Some(include) = include {
                        self.include(&include, origin);
                    }
                }
                Err(message) => self.push_error(Diagnostic::error(message), file, line, column),
            }
        }

        self.append_body(&text[pos..], pos, text, &index, file);
    }

    fn include(&mut self, directive: &Directive, origin: &Path) {
        let Some(requested) = directive.attribute("file") else {
            self.template.errors.push(
                directive.diagnostic(Diagnostic::error("Include directive is missing the 'file' attribute")),
            );
            return;
        };

        if self.include_stack.len() > MAX_INCLUDE_DEPTH {
            self.template.errors.push(directive.diagnostic(Diagnostic::error(format!(
                "Include depth exceeds {MAX_INCLUDE_DEPTH} while including '{requested}'"
            ))));
            return;
        }

        let (path, text) = match self.includes.resolve(requested, origin) {
            Ok(resolved) => resolved,
            Err(diagnostic) => {
                self.template.errors.push(directive.diagnostic(diagnostic));
                return;
            }
        };

        if self.include_stack.contains(&path) {
            self.template.errors.push(directive.diagnostic(Diagnostic::error(format!(
                "Recursive include of '{}'",
                path.display()
            ))));
            return;
        }

        if !self.template.dependencies.contains(&path) {
            self.template.dependencies.push(path.clone());
        }

        self.include_stack.push(path.clone());
        self.parse_text(&text, Some(&path), &path);
        self.include_stack.pop();
    }

    fn append_body(
        &mut self,
        segment: &str,
        offset: usize,
        text: &str,
        index: &LineIndex,
        file: Option<&Path>,
    ) {
        for (i, c) in segment.char_indices() {
            if self.at_line_start {
                let (line, _) = index.locate(text, offset + i);
                self.template.line_map.push(SourceLine {
                    file: file.map(Path::to_path_buf),
                    line,
                });
                self.at_line_start = false;
            }
            if c == '\n' {
                self.at_line_start = true;
            }
        }
        self.template.body.push_str(segment);
    }

    fn push_error(&mut self, diagnostic: Diagnostic, file: Option<&Path>, line: usize, column: usize) {
        let diagnostic = diagnostic.at(line, column);
        let diagnostic = match file {
            Some(file) => diagnostic.in_file(file),
            None => diagnostic,
        };
        self.template.errors.push(diagnostic);
    }
}

type DirectiveParts = (String, BTreeMap<String, String>);

/// Parse the text between `<#@` and `#>`.
fn parse_directive(content: &str) -> Result<DirectiveParts, String> {
    let mut rest = content.trim_start();

    let name_len = identifier_len(rest);
    if name_len == 0 {
        return Err("Directive is missing a name".to_string());
    }
    let name = rest[..name_len].to_ascii_lowercase();
    rest = &rest[name_len..];

    let mut attributes = BTreeMap::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let key_len = identifier_len(rest);
        if key_len == 0 {
            return Err(format!("Unexpected text in '{name}' directive: '{}'", rest.trim_end()));
        }
        let key = rest[..key_len].to_ascii_lowercase();
        rest = rest[key_len..].trim_start();

        let Some(after_eq) = rest.strip_prefix('=') else {
            return Err(format!("Attribute '{key}' in '{name}' directive has no value"));
        };
        rest = after_eq.trim_start();

        let quote = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(format!("Value of attribute '{key}' in '{name}' directive must be quoted")),
        };
        let Some(end) = rest[1..].find(quote) else {
            return Err(format!("Unterminated value for attribute '{key}' in '{name}' directive"));
        };
        let value = rest[1..1 + end].to_string();
        rest = &rest[end + 2..];

        if attributes.insert(key.clone(), value).is_some() {
            return Err(format!("Duplicate attribute '{key}' in '{name}' directive"));
        }
    }

    Ok((name, attributes))
}

fn identifier_len(text: &str) -> usize {
    text.char_indices()
        .take_while(|(i, c)| {
            c.is_ascii_alphabetic() || *c == '_' || (*i > 0 && (c.is_ascii_digit() || *c == '-' || *c == '.'))
        })
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0)
}
