//! Build snapshots.
//!
//! A [`BuildSnapshot`] describes one build invocation: which templates to
//! transform or preprocess, where their outputs go, and the run-wide
//! settings the generator is configured with. The snapshot written at the
//! end of a run (`.ttbuild/state.toml`) is the "previous" snapshot of the
//! next one, which is what makes builds incremental.
//!
//! # File Format
//!
//! ```toml
//! version = 1
//! default_namespace = "MyApp.Generated"
//! include_paths = ["templates/include"]
//!
//! [[parameters]]
//! name = "Count"
//! value = "42"
//!
//! [[transform]]
//! input_file = "templates/greeting.tt"
//! output_file = "templates/greeting.txt"
//! dependencies = ["templates/include/header.ttinclude"]
//!
//! [[preprocess]]
//! input_file = "templates/Report.tt"
//! output_file = "src/generated/report.rs"
//! generated = true
//! ```

pub mod io;
pub mod staleness;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::STATE_VERSION;
use crate::templating::{GeneratorConfig, ParameterMap};

pub use staleness::{PreprocessItem, TransformItem, WorkLists, compute_work};

/// A directive processor made available to templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveProcessorRegistration {
    /// Name templates use in a `processor` attribute
    pub name: String,
    /// Implementing class
    #[serde(default)]
    pub class: String,
    /// Assembly containing the class
    #[serde(default)]
    pub assembly: String,
}

/// One `(processor, directive, name, value)` build parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterTuple {
    /// Directive processor the parameter is scoped to; empty for any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub processor: String,
    /// Directive the parameter is scoped to; empty for any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub directive: String,
    /// Parameter name
    pub name: String,
    /// Raw value
    pub value: String,
}

/// A template rendered straight to an output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRecord {
    /// Template path
    pub input_file: PathBuf,
    /// Where the last successful run wrote the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    /// Included files seen by the last successful run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<PathBuf>,
}

impl TransformRecord {
    /// A record for a template that has not been processed yet.
    pub fn new(input_file: impl Into<PathBuf>) -> Self {
        Self {
            input_file: input_file.into(),
            output_file: None,
            dependencies: Vec::new(),
        }
    }
}

/// A template compiled into generator source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessRecord {
    /// Template path
    pub input_file: PathBuf,
    /// Generated source path
    pub output_file: PathBuf,
    /// Generated type name; derived from the input file name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Namespace used when the template declares none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Whether the last run generated `output_file` successfully
    #[serde(default)]
    pub generated: bool,
    /// Included files seen by the last successful run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<PathBuf>,
}

impl PreprocessRecord {
    /// A record for a template that has not been processed yet.
    pub fn new(input_file: impl Into<PathBuf>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            input_file: input_file.into(),
            output_file: output_file.into(),
            class_name: None,
            namespace: None,
            generated: false,
            dependencies: Vec::new(),
        }
    }
}

/// Inputs and settings of one build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSnapshot {
    /// Format version
    pub version: u32,
    /// Namespace for preprocessed templates that declare none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<String>,
    /// Directories searched for included files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_paths: Vec<PathBuf>,
    /// Reference search paths handed to the generator
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_paths: Vec<PathBuf>,
    /// Assembly references handed to the generator
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assembly_references: Vec<String>,
    /// Registered directive processors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directive_processors: Vec<DirectiveProcessorRegistration>,
    /// Build parameters in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterTuple>,
    /// Templates to transform
    #[serde(default, rename = "transform", skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<TransformRecord>,
    /// Templates to preprocess
    #[serde(default, rename = "preprocess", skip_serializing_if = "Vec::is_empty")]
    pub preprocessed: Vec<PreprocessRecord>,
}

impl Default for BuildSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSnapshot {
    /// An empty snapshot at the current format version.
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            default_namespace: None,
            include_paths: Vec::new(),
            reference_paths: Vec::new(),
            assembly_references: Vec::new(),
            directive_processors: Vec::new(),
            parameters: Vec::new(),
            transforms: Vec::new(),
            preprocessed: Vec::new(),
        }
    }

    /// Build parameters flattened by name; the last tuple for a name wins.
    pub fn parameter_map(&self) -> ParameterMap {
        self.parameters.iter().map(|p| (p.name.as_str(), p.value.as_str())).collect()
    }

    /// Generator configuration for this run.
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            reference_paths: self.reference_paths.clone(),
            assembly_references: self.assembly_references.clone(),
            include_paths: self.include_paths.clone(),
        }
    }

    /// Whether every run-wide setting equals `other`'s.
    ///
    /// When they differ, every template has to be processed again.
    pub fn settings_match(&self, other: &Self) -> bool {
        self.default_namespace == other.default_namespace
            && self.include_paths == other.include_paths
            && self.reference_paths == other.reference_paths
            && self.assembly_references == other.assembly_references
            && self.directive_processors == other.directive_processors
            && self.parameters == other.parameters
    }

    /// The transform record for `input_file`.
    pub fn transform_record(&self, input_file: &Path) -> Option<&TransformRecord> {
        self.transforms.iter().find(|r| r.input_file == input_file)
    }

    /// The preprocess record for `input_file`.
    pub fn preprocess_record(&self, input_file: &Path) -> Option<&PreprocessRecord> {
        self.preprocessed.iter().find(|r| r.input_file == input_file)
    }
}
