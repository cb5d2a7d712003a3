//! Tera-backed [`TemplateGenerator`].
//!
//! Template bodies are Tera templates. Transforming renders the body with the
//! parameter session as context; preprocessing checks that the body compiles
//! and emits a Rust generator module (see [`super::codegen`]).

use std::path::Path;

use regex::Regex;
use tera::{Context as TeraContext, Tera};

use super::codegen::generate_module;
use super::coercion::{ConverterRegistry, conversion_failure_message};
use super::diagnostics::{Diagnostic, Diagnostics};
use super::directives::{FileIncludeResolver, ParsedTemplate, parse_template};
use super::generator::{GeneratorConfig, RenderedOutput, TemplateGenerator};
use super::session::Session;
use super::settings::{TemplateSettings, derive_settings};
use crate::snapshot::{DirectiveProcessorRegistration, ParameterTuple};
use crate::utils::fs::FileSystem;

/// Name Tera gives templates rendered with [`Tera::one_off`].
const ONE_OFF_NAME: &str = "__tera_one_off";

/// Generator rendering template bodies with Tera.
pub struct TeraGenerator<F: FileSystem> {
    config: GeneratorConfig,
    fs: F,
    processors: Vec<DirectiveProcessorRegistration>,
    host_parameters: Vec<ParameterTuple>,
    session: Session,
    converters: ConverterRegistry,
    errors: Diagnostics,
}

impl<F: FileSystem> TeraGenerator<F> {
    /// Create a generator reading includes through `fs`.
    pub fn new(config: GeneratorConfig, fs: F) -> Self {
        tracing::debug!(
            include_paths = config.include_paths.len(),
            reference_paths = config.reference_paths.len(),
            assembly_references = config.assembly_references.len(),
            "Creating template generator"
        );
        Self {
            config,
            fs,
            processors: Vec::new(),
            host_parameters: Vec::new(),
            session: Session::new(),
            converters: ConverterRegistry::new(),
            errors: Diagnostics::new(),
        }
    }

    /// Value of the last host parameter registered under `name`.
    fn host_parameter(&self, name: &str) -> Option<&str> {
        self.host_parameters.iter().rev().find(|p| p.name == name).map(|p| p.value.as_str())
    }

    /// Rendering context: the session plus declared parameters the session
    /// lacks, resolved from host parameters.
    fn build_context(&mut self, template: &ParsedTemplate) -> TeraContext {
        let mut context = TeraContext::new();
        for (name, value) in self.session.iter() {
            context.insert(name.as_str(), value);
        }

        for directive in template.directives_named("parameter") {
            let Some(name) = directive.attribute("name") else {
                continue;
            };
            if context.contains_key(name) {
                continue;
            }
            let declared = directive.attribute("type");
            match self.host_parameter(name).map(str::to_string) {
                Some(raw) => match self.converters.convert(declared, &raw) {
                    Ok(value) => context.insert(name, &value),
                    Err(_) => self.errors.push(directive.diagnostic(Diagnostic::error(
                        conversion_failure_message(name, &raw, declared.unwrap_or_default()),
                    ))),
                },
                None => self.errors.push(
                    directive.diagnostic(Diagnostic::warning(format!("Parameter '{name}' has no value"))),
                ),
            }
        }

        context
    }

    /// Record a Tera failure as a diagnostic located in the template source.
    fn push_tera_error(&mut self, template: &ParsedTemplate, error: &tera::Error) {
        let mut diagnostic = Diagnostic::error(format_tera_error(error));

        if let Some((line, column)) = tera_error_location(error) {
            match template.source_line(line) {
                Some(source) => {
                    diagnostic = diagnostic.at(source.line, column);
                    if let Some(file) = &source.file {
                        diagnostic = diagnostic.in_file(file);
                    }
                }
                None => diagnostic = diagnostic.at(line, column),
            }
        }

        self.errors.push(diagnostic);
    }
}

impl<F: FileSystem> TemplateGenerator for TeraGenerator<F> {
    fn add_directive_processor(&mut self, registration: &DirectiveProcessorRegistration) {
        tracing::debug!(name = %registration.name, class = %registration.class, "Registering directive processor");
        self.processors.retain(|p| p.name != registration.name);
        self.processors.push(registration.clone());
    }

    fn add_parameter(&mut self, parameter: &ParameterTuple) {
        self.host_parameters.push(parameter.clone());
    }

    fn parse(&mut self, input: &Path, content: &str) -> ParsedTemplate {
        let mut resolver = FileIncludeResolver::new(&self.fs, &self.config.include_paths);
        parse_template(content, input, &mut resolver)
    }

    fn settings(&self, template: &mut ParsedTemplate) -> TemplateSettings {
        derive_settings(template, &self.processors)
    }

    fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn session_with_converters(&mut self) -> (&mut Session, &ConverterRegistry) {
        (&mut self.session, &self.converters)
    }

    fn process_template(
        &mut self,
        template: &ParsedTemplate,
        input: &Path,
        _content: &str,
        output: &Path,
        settings: &TemplateSettings,
    ) -> Option<RenderedOutput> {
        let context = self.build_context(template);
        if self.errors.has_errors() {
            return None;
        }

        tracing::trace!(input = %input.display(), "Rendering template body");
        match Tera::one_off(&template.body, &context, false) {
            Ok(text) => {
                let path = match &settings.extension {
                    Some(extension) => output.with_extension(extension),
                    None => output.to_path_buf(),
                };
                Some(RenderedOutput {
                    text,
                    path,
                })
            }
            Err(e) => {
                self.push_tera_error(template, &e);
                None
            }
        }
    }

    fn preprocess_template(
        &mut self,
        template: &ParsedTemplate,
        input: &Path,
        _content: &str,
        class_name: &str,
        settings: &TemplateSettings,
    ) -> Option<String> {
        let mut tera = Tera::default();
        if let Err(e) = tera.add_raw_template(ONE_OFF_NAME, &template.body) {
            self.push_tera_error(template, &e);
            return None;
        }

        let source_name =
            input.file_name().map_or_else(|| input.display().to_string(), |n| n.to_string_lossy().into_owned());
        Some(generate_module(template, &source_name, class_name, settings))
    }

    fn errors_mut(&mut self) -> &mut Diagnostics {
        &mut self.errors
    }
}

/// Line and column Tera reports for a parse failure (`--> 3:7`).
fn tera_error_location(error: &tera::Error) -> Option<(usize, usize)> {
    use std::error::Error;

    let re = Regex::new(r"-->\s*(\d+):(\d+)").ok()?;
    let mut current: Option<&dyn Error> = Some(error);
    while let Some(err) = current {
        if let Some(caps) = re.captures(&err.to_string()) {
            let line = caps.get(1)?.as_str().parse().ok()?;
            let column = caps.get(2)?.as_str().parse().ok()?;
            return Some((line, column));
        }
        current = err.source();
    }
    None
}

/// Flatten a Tera error chain into one message.
///
/// Internal template names are removed, and the source excerpt pest prints
/// for syntax errors is reduced to its summary line.
pub fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut all_messages = vec![error.to_string()];
    let mut current_error: Option<&dyn Error> = error.source();
    while let Some(err) = current_error {
        all_messages.push(err.to_string());
        current_error = err.source();
    }

    let messages: Vec<String> = all_messages
        .iter()
        .map(|msg| summarize(msg))
        .map(|msg| {
            msg.replace(&format!("while rendering '{ONE_OFF_NAME}'"), "")
                .replace(&format!("Failed to render '{ONE_OFF_NAME}'"), "Template rendering failed")
                .replace(&format!("Failed to parse '{ONE_OFF_NAME}'"), "Template syntax error")
                .replace(&format!("'{ONE_OFF_NAME}'"), "template")
                .replace(ONE_OFF_NAME, "template")
                .trim()
                .to_string()
        })
        .filter(|msg| {
            !msg.is_empty() && msg != "Template rendering failed" && msg != "Template syntax error"
        })
        .collect();

    if messages.is_empty() {
        "Template syntax error".to_string()
    } else {
        messages.join(": ")
    }
}

/// The `= expected ...` line of a pest excerpt, or the message unchanged.
fn summarize(message: &str) -> String {
    if !message.contains("-->") {
        return message.to_string();
    }
    message
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("= "))
        .unwrap_or_else(|| message.lines().next().unwrap_or_default())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::session::ParameterValue;
    use crate::utils::fs::LiveFileSystem;
    use std::path::PathBuf;

    fn generator() -> TeraGenerator<LiveFileSystem> {
        TeraGenerator::new(GeneratorConfig::default(), LiveFileSystem)
    }

    fn render(generator: &mut TeraGenerator<LiveFileSystem>, text: &str) -> Option<RenderedOutput> {
        let input = Path::new("greeting.tt");
        let mut template = generator.parse(input, text);
        let settings = generator.settings(&mut template);
        assert!(!template.errors.has_errors(), "{:?}", template.errors);
        generator.process_template(&template, input, text, Path::new("greeting.txt"), &settings)
    }

    #[test]
    fn test_render_hello_world() {
        let mut generator = generator();
        let output =
            render(&mut generator, "<#@ template language=\"Rust\" #>\nHello, {{ \"World\" }}!").unwrap();
        assert_eq!(output.text, "Hello, World!");
        assert_eq!(output.path, PathBuf::from("greeting.txt"));
        assert!(generator.errors_mut().is_empty());
    }

    #[test]
    fn test_output_extension_changes_path() {
        let mut generator = generator();
        let output = render(&mut generator, "<#@ output extension=\".md\" #>\n# Title").unwrap();
        assert_eq!(output.path, PathBuf::from("greeting.md"));
    }

    #[test]
    fn test_session_values_reach_context() {
        let mut generator = generator();
        generator.session_mut().insert("Count", ParameterValue::Int(41));
        let output = render(
            &mut generator,
            "<#@ parameter name=\"Count\" type=\"int\" #>\n{{ Count + 1 }}",
        )
        .unwrap();
        assert_eq!(output.text, "42");
    }

    #[test]
    fn test_host_parameter_fallback() {
        let mut generator = generator();
        generator.add_parameter(&ParameterTuple {
            processor: String::new(),
            directive: String::new(),
            name: "Enabled".to_string(),
            value: "true".to_string(),
        });
        let output = render(
            &mut generator,
            "<#@ parameter name=\"Enabled\" type=\"bool\" #>\n{% if Enabled %}on{% endif %}",
        )
        .unwrap();
        assert_eq!(output.text, "on");
    }

    #[test]
    fn test_unset_parameter_warns() {
        let mut generator = generator();
        let output = render(&mut generator, "<#@ parameter name=\"Title\" #>\nstatic").unwrap();
        assert_eq!(output.text, "static");
        let errors = generator.errors_mut();
        assert_eq!(errors.len(), 1);
        assert!(!errors.has_errors());
    }

    #[test]
    fn test_syntax_error_maps_to_source_line() {
        let mut generator = generator();
        let output = render(&mut generator, "<#@ template #>\nfirst\n{% if %}\n");
        assert!(output.is_none());

        let errors = generator.errors_mut();
        assert!(errors.has_errors());
        let diagnostic = errors.iter().next().unwrap();
        assert_eq!(diagnostic.line, 3);
        assert!(!diagnostic.message.contains(ONE_OFF_NAME), "{}", diagnostic.message);
    }

    #[test]
    fn test_missing_variable_is_engine_error() {
        let mut generator = generator();
        assert!(render(&mut generator, "{{ nope }}").is_none());
        let message = &generator.errors_mut().iter().next().unwrap().message;
        assert!(message.contains("nope"), "{message}");
    }

    #[test]
    fn test_preprocess_emits_module() {
        let mut generator = generator();
        let input = Path::new("Report.tt");
        let text = "<#@ parameter name=\"Count\" type=\"int\" #>\n{{ Count }} rows";
        let mut template = generator.parse(input, text);
        let mut settings = generator.settings(&mut template);
        settings.namespace = Some("MyApp.Generated".to_string());

        let code = generator.preprocess_template(&template, input, text, "Report", &settings).unwrap();
        assert!(code.contains("pub mod Generated"));
        assert!(code.contains("pub struct Report"));
        assert!(code.contains("from Report.tt"));
    }

    #[test]
    fn test_preprocess_reports_syntax_errors() {
        let mut generator = generator();
        let input = Path::new("Broken.tt");
        let text = "{% for %}";
        let mut template = generator.parse(input, text);
        let settings = generator.settings(&mut template);
        assert!(generator.preprocess_template(&template, input, text, "Broken", &settings).is_none());
        assert!(generator.errors_mut().has_errors());
    }
}
