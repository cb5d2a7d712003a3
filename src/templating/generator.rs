//! The generator seam used by the processor.

use std::path::{Path, PathBuf};

use super::coercion::ConverterRegistry;
use super::diagnostics::Diagnostics;
use super::directives::ParsedTemplate;
use super::session::Session;
use super::settings::TemplateSettings;
use crate::snapshot::{DirectiveProcessorRegistration, ParameterTuple};

/// Run-wide configuration a generator is constructed with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Reference search paths
    pub reference_paths: Vec<PathBuf>,
    /// Assembly references
    pub assembly_references: Vec<String>,
    /// Directories searched for included files
    pub include_paths: Vec<PathBuf>,
}

/// Output of a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
    /// Rendered text
    pub text: String,
    /// Path the text should be written to
    pub path: PathBuf,
}

/// Parses, renders and preprocesses templates for one build run.
///
/// A generator is a single owned value that the processor threads through the
/// whole batch by `&mut`. Failures are never returned as `Err`: they are
/// pushed onto [`errors_mut`](Self::errors_mut) (engine failures) or onto the
/// parsed template's own diagnostics (parse failures), and the caller drains
/// both.
pub trait TemplateGenerator {
    /// Register a directive processor.
    fn add_directive_processor(&mut self, registration: &DirectiveProcessorRegistration);

    /// Register a host parameter.
    fn add_parameter(&mut self, parameter: &ParameterTuple);

    /// Parse template text read from `input`.
    fn parse(&mut self, input: &Path, content: &str) -> ParsedTemplate;

    /// Derive settings for a parsed template, adding any problems to its diagnostics.
    fn settings(&self, template: &mut ParsedTemplate) -> TemplateSettings;

    /// The run's parameter session.
    fn session_mut(&mut self) -> &mut Session;

    /// The session together with the converters, for coercion.
    fn session_with_converters(&mut self) -> (&mut Session, &ConverterRegistry);

    /// Render a template. `output` is the path the caller intends to write;
    /// the returned path may differ when the template sets its own extension.
    fn process_template(
        &mut self,
        template: &ParsedTemplate,
        input: &Path,
        content: &str,
        output: &Path,
        settings: &TemplateSettings,
    ) -> Option<RenderedOutput>;

    /// Produce generator source code for a template.
    fn preprocess_template(
        &mut self,
        template: &ParsedTemplate,
        input: &Path,
        content: &str,
        class_name: &str,
        settings: &TemplateSettings,
    ) -> Option<String>;

    /// Diagnostics raised by the last render or preprocess.
    fn errors_mut(&mut self) -> &mut Diagnostics;
}
