//! Per-template settings derived from directives.

use std::fmt;

use strsim::jaro_winkler;

use super::diagnostics::Diagnostic;
use super::directives::ParsedTemplate;
use crate::snapshot::DirectiveProcessorRegistration;

/// Directives understood by the built-in generator.
const KNOWN_DIRECTIVES: &[&str] = &["template", "output", "parameter", "include", "import", "assembly"];

/// Text encoding of a written output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// UTF-8 without byte-order mark
    Utf8,
    /// UTF-8 with byte-order mark
    Utf8Bom,
    /// UTF-16 little endian with byte-order mark
    Utf16Le,
    /// UTF-16 big endian with byte-order mark
    Utf16Be,
    /// 7-bit ASCII; other characters are written as `?`
    Ascii,
}

impl OutputEncoding {
    /// Look up an encoding by the name used in an `output` directive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "utf-8-bom" | "utf8-bom" => Some(Self::Utf8Bom),
            "utf-16" | "utf-16le" | "unicode" => Some(Self::Utf16Le),
            "utf-16be" | "bigendianunicode" => Some(Self::Utf16Be),
            "ascii" | "us-ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    /// Encode `text` to bytes, including any byte-order mark.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf8Bom => {
                let mut bytes = vec![0xEF, 0xBB, 0xBF];
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
            Self::Utf16Le => {
                let mut bytes = vec![0xFF, 0xFE];
                bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                bytes
            }
            Self::Utf16Be => {
                let mut bytes = vec![0xFE, 0xFF];
                bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                bytes
            }
            Self::Ascii => text.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }).collect(),
        }
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Bom => "utf-8-bom",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Ascii => "ascii",
        };
        write!(f, "{name}")
    }
}

/// Encode output text, defaulting to UTF-8 without a byte-order mark.
pub fn encode_output(text: &str, encoding: Option<OutputEncoding>) -> Vec<u8> {
    encoding.unwrap_or(OutputEncoding::Utf8).encode(text)
}

/// Visibility of a preprocessed generator type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    /// `pub`
    #[default]
    Public,
    /// `pub(crate)`
    Internal,
}

/// Settings for one template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSettings {
    /// Value of `template language`, informational
    pub language: Option<String>,
    /// Namespace from `template namespace`
    pub namespace: Option<String>,
    /// Output extension from `output extension`, without the leading dot
    pub extension: Option<String>,
    /// Output encoding; `None` means the default
    pub encoding: Option<OutputEncoding>,
    /// Visibility of a preprocessed type
    pub visibility: Visibility,
    /// Modules named by `import` directives
    pub imports: Vec<String>,
    /// Assemblies named by `assembly` directives
    pub assemblies: Vec<String>,
}

/// Derive settings from a parsed template.
///
/// Problems are added to the template's diagnostics: unknown encodings,
/// visibilities and directives are warnings; a reference to an unregistered
/// directive processor or a nameless `parameter` directive is an error.
pub fn derive_settings(
    template: &mut ParsedTemplate,
    processors: &[DirectiveProcessorRegistration],
) -> TemplateSettings {
    let mut settings = TemplateSettings::default();
    let mut problems = Vec::new();

    for directive in &template.directives {
        if let Some(processor) = directive.attribute("processor") {
            if !processors.iter().any(|p| p.name == processor) {
                problems.push(directive.diagnostic(Diagnostic::error(format!(
                    "Directive processor '{processor}' is not registered"
                ))));
            }
            continue;
        }

        match directive.name.as_str() {
            "template" => {
                if let Some(language) = directive.attribute("language") {
                    settings.language = Some(language.to_string());
                }
                if let Some(namespace) = directive.attribute("namespace").filter(|n| !n.is_empty()) {
                    settings.namespace = Some(namespace.to_string());
                }
                match directive.attribute("visibility").map(str::to_ascii_lowercase).as_deref() {
                    None | Some("public") => {}
                    Some("internal") => settings.visibility = Visibility::Internal,
                    Some(other) => problems.push(directive.diagnostic(Diagnostic::warning(format!(
                        "Unknown visibility '{other}', using public"
                    )))),
                }
            }
            "output" => {
                if let Some(extension) = directive.attribute("extension") {
                    settings.extension = Some(extension.trim_start_matches('.').to_string());
                }
                if let Some(name) = directive.attribute("encoding") {
                    match OutputEncoding::from_name(name) {
                        Some(encoding) => settings.encoding = Some(encoding),
                        None => problems.push(directive.diagnostic(Diagnostic::warning(format!(
                            "Unknown output encoding '{name}', using utf-8"
                        )))),
                    }
                }
            }
            "parameter" => {
                if directive.attribute("name").is_none_or(str::is_empty) {
                    problems.push(directive.diagnostic(Diagnostic::error(
                        "Parameter directive is missing the 'name' attribute",
                    )));
                }
            }
            "import" => {
                if let Some(namespace) = directive.attribute("namespace") {
                    settings.imports.push(namespace.to_string());
                }
            }
            "assembly" => {
                if let Some(name) = directive.attribute("name") {
                    settings.assemblies.push(name.to_string());
                }
            }
            "include" => {}
            unknown => {
                let mut message = format!("Unknown directive '{unknown}' ignored");
                if let Some(similar) = similar_directive(unknown) {
                    message.push_str(&format!("; did you mean '{similar}'?"));
                }
                problems.push(directive.diagnostic(Diagnostic::warning(message)));
            }
        }
    }

    template.errors.extend(problems);
    settings
}

fn similar_directive(name: &str) -> Option<&'static str> {
    KNOWN_DIRECTIVES
        .iter()
        .map(|known| (*known, jaro_winkler(known, name)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}
