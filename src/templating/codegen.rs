//! Rust source emitted for preprocessed templates.
//!
//! A preprocessed template becomes a struct with one field per declared
//! parameter and a `transform_text` method that renders the embedded body
//! with Tera:
//!
//! ```text
//! pub mod MyApp {
//!     pub mod Generated {
//!         #[derive(Debug, Clone, Default, serde::Serialize)]
//!         pub struct Report {
//!             pub Count: i32,
//!         }
//!
//!         impl Report {
//!             pub const TEMPLATE: &'static str = r#"..."#;
//!
//!             pub fn transform_text(&self) -> tera::Result<String> { ... }
//!         }
//!     }
//! }
//! ```

use std::fmt::Write as _;

use super::coercion::canonical_type_name;
use super::directives::ParsedTemplate;
use super::settings::{TemplateSettings, Visibility};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false", "fn",
    "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "abstract", "become",
    "box", "do", "final", "gen", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Turn arbitrary text into a Rust identifier.
///
/// Characters that cannot appear in an identifier become `_`, a leading digit
/// gets a `_` prefix, and keywords are escaped.
pub fn sanitize_identifier(name: &str) -> String {
    let mut ident: String =
        name.chars().map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }).collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if RESERVED.contains(&ident.as_str()) {
        ident.push('_');
    } else if KEYWORDS.contains(&ident.as_str()) {
        ident.insert_str(0, "r#");
    }
    ident
}

/// Rust field type for a declared parameter type.
///
/// Types without a built-in mapping are carried as `String`.
pub fn rust_type_for(declared: Option<&str>) -> &'static str {
    match canonical_type_name(declared).as_str() {
        "bool" => "bool",
        "char" => "char",
        "i8" => "i8",
        "u8" => "u8",
        "i16" => "i16",
        "u16" => "u16",
        "i32" => "i32",
        "u32" => "u32",
        "i64" => "i64",
        "u64" => "u64",
        "f32" => "f32",
        "f64" => "f64",
        _ => "String",
    }
}

/// Split a namespace on `.` or `::` into module names.
pub fn namespace_segments(namespace: &str) -> Vec<String> {
    namespace
        .split("::")
        .flat_map(|part| part.split('.'))
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(sanitize_identifier)
        .collect()
}

/// A raw string literal containing `text`.
fn raw_string_literal(text: &str) -> String {
    let mut longest = 0;
    let mut current: Option<usize> = None;
    for c in text.chars() {
        current = match (c, current) {
            ('"', _) => Some(0),
            ('#', Some(n)) => Some(n + 1),
            _ => None,
        };
        longest = longest.max(current.unwrap_or(0));
    }
    let hashes = "#".repeat(longest + 1);
    format!("r{hashes}\"{text}\"{hashes}")
}

struct Emitter {
    out: String,
    depth: usize,
}

impl Emitter {
    fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.out.push('\n');
        } else {
            let _ = writeln!(self.out, "{}{text}", "    ".repeat(self.depth));
        }
    }

    fn open(&mut self, text: &str) {
        self.line(&format!("{text} {{"));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth -= 1;
        self.line("}");
    }
}

/// Emit the generator module for a preprocessed template.
///
/// `settings.namespace` selects the enclosing modules; an empty or missing
/// namespace emits the struct at the top level.
pub fn generate_module(
    template: &ParsedTemplate,
    source_name: &str,
    class_name: &str,
    settings: &TemplateSettings,
) -> String {
    let visibility = match settings.visibility {
        Visibility::Public => "pub",
        Visibility::Internal => "pub(crate)",
    };
    let class = sanitize_identifier(class_name);
    let mut emitter = Emitter {
        out: String::new(),
        depth: 0,
    };

    emitter.line("// <auto-generated>");
    emitter.line(&format!("//     Generated by ttbuild from {source_name}."));
    emitter.line("//     Changes to this file will be lost when it is regenerated.");
    emitter.line("// </auto-generated>");
    emitter.line("");

    let segments = settings.namespace.as_deref().map(namespace_segments).unwrap_or_default();
    for segment in &segments {
        emitter.line("#[allow(non_snake_case, dead_code, unused_imports)]");
        emitter.open(&format!("pub mod {segment}"));
    }

    if !settings.imports.is_empty() {
        for import in &settings.imports {
            emitter.line(&format!("use {};", import.replace('.', "::")));
        }
        emitter.line("");
    }

    emitter.line("#[derive(Debug, Clone, Default, serde::Serialize)]");
    emitter.line("#[allow(non_snake_case)]");
    emitter.open(&format!("{visibility} struct {class}"));
    let mut seen = Vec::new();
    for directive in template.directives_named("parameter") {
        let Some(name) = directive.attribute("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        if seen.contains(&name) {
            continue;
        }
        seen.push(name);

        let field = sanitize_identifier(name);
        if field.trim_start_matches("r#") != name {
            emitter.line(&format!("#[serde(rename = {name:?})]"));
        }
        emitter.line(&format!("pub {field}: {},", rust_type_for(directive.attribute("type"))));
    }
    emitter.close();
    emitter.line("");

    emitter.open(&format!("impl {class}"));
    emitter.line("/// Template body rendered by [`Self::transform_text`].");
    emitter.line(&format!("pub const TEMPLATE: &'static str = {};", raw_string_literal(&template.body)));
    emitter.line("");
    emitter.line("/// Render the template with this instance's fields as parameters.");
    emitter.open("pub fn transform_text(&self) -> tera::Result<String>");
    emitter.line("let context = tera::Context::from_serialize(self)?;");
    emitter.line("tera::Tera::one_off(Self::TEMPLATE, &context, false)");
    emitter.close();
    emitter.close();

    for _ in &segments {
        emitter.close();
    }

    emitter.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::diagnostics::Diagnostic;
    use crate::templating::directives::{IncludeResolver, parse_template};
    use std::path::{Path, PathBuf};

    struct NoIncludes;

    impl IncludeResolver for NoIncludes {
        fn resolve(&mut self, file: &str, _from: &Path) -> Result<(PathBuf, String), Diagnostic> {
            Err(Diagnostic::error(file))
        }
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("Report"), "Report");
        assert_eq!(sanitize_identifier("my-report.v2"), "my_report_v2");
        assert_eq!(sanitize_identifier("2fast"), "_2fast");
        assert_eq!(sanitize_identifier("type"), "r#type");
        assert_eq!(sanitize_identifier("self"), "self_");
        assert_eq!(sanitize_identifier(""), "__");
        assert_eq!(sanitize_identifier("_"), "__");
    }

    #[test]
    fn test_raw_string_uses_enough_hashes() {
        assert_eq!(raw_string_literal("plain"), "r#\"plain\"#");
        assert_eq!(raw_string_literal("a \"# b"), "r##\"a \"# b\"##");
    }

    #[test]
    fn test_module_layout() {
        let template = parse_template(
            "<#@ parameter name=\"Count\" type=\"int\" #><#@ parameter name=\"Title\" #>\
             <#@ parameter name=\"type\" type=\"bool\" #><#@ parameter name=\"page-size\" type=\"u32\" #>{{ Title }}: {{ Count }}",
            Path::new("Report.tt"),
            &mut NoIncludes,
        );
        let settings = TemplateSettings {
            namespace: Some("MyApp.Generated".to_string()),
            ..TemplateSettings::default()
        };
        let code = generate_module(&template, "Report.tt", "Report", &settings);

        assert!(code.contains("pub mod MyApp {"), "{code}");
        assert!(code.contains("    pub mod Generated {"), "{code}");
        assert!(code.contains("        pub struct Report {"), "{code}");
        assert!(code.contains("pub Count: i32,"));
        assert!(code.contains("pub Title: String,"));
        assert!(code.contains("pub r#type: bool,"));
        assert!(code.contains("#[serde(rename = \"page-size\")]"));
        assert!(code.contains("pub page_size: u32,"));
        assert!(code.contains("pub const TEMPLATE: &'static str = r#\"{{ Title }}: {{ Count }}\"#;"));
        assert!(code.trim_end().ends_with('}'));
    }

    #[test]
    fn test_internal_without_namespace() {
        let template = parse_template("body", Path::new("x.tt"), &mut NoIncludes);
        let settings = TemplateSettings {
            visibility: Visibility::Internal,
            imports: vec!["std.fmt".to_string()],
            ..TemplateSettings::default()
        };
        let code = generate_module(&template, "x.tt", "x", &settings);

        assert!(!code.contains("pub mod"));
        assert!(code.contains("use std::fmt;"));
        assert!(code.contains("pub(crate) struct x {"));
    }
}
