//! Template parsing, parameter coercion and rendering.
//!
//! The processor talks to this module through the [`TemplateGenerator`]
//! trait. The built-in implementation, [`TeraGenerator`], parses
//! `<#@ ... #>` directives itself and hands the remaining body to Tera.
//!
//! # Template Format
//!
//! ```text
//! <#@ template language="Rust" namespace="MyApp.Views" #>
//! <#@ output extension=".html" encoding="utf-8" #>
//! <#@ parameter name="Title" #>
//! <#@ parameter name="Count" type="int" #>
//! <#@ include file="header.ttinclude" #>
//! <h1>{{ Title }}</h1>
//! {% for i in range(end=Count) %}<p>{{ i }}</p>{% endfor %}
//! ```
//!
//! # Modules
//!
//! - [`directives`] - directive parser and include expansion
//! - [`coercion`] - typed parameters and the converter registry
//! - [`settings`] - per-template settings and output encodings
//! - [`diagnostics`] - diagnostic collections and draining them into the build log
//! - [`generator`] - the generator trait
//! - [`engine`] - the Tera-backed generator
//! - [`codegen`] - Rust source for preprocessed templates

pub mod codegen;
pub mod coercion;
pub mod diagnostics;
pub mod directives;
pub mod engine;
pub mod generator;
pub mod session;
pub mod settings;

pub use coercion::{ConverterRegistry, ParameterMap, coerce_parameters};
pub use diagnostics::{Diagnostic, Diagnostics, log_and_clear};
pub use directives::{Directive, ParsedTemplate};
pub use engine::TeraGenerator;
pub use generator::{GeneratorConfig, RenderedOutput, TemplateGenerator};
pub use session::{ParameterValue, Session};
pub use settings::{OutputEncoding, TemplateSettings, Visibility, encode_output};
