//! Build configuration (`ttbuild.toml`).
//!
//! The configuration lists the templates to build and the run-wide settings
//! handed to the generator. It is turned into the current [`BuildSnapshot`]
//! at the start of every run.
//!
//! ```toml
//! default_namespace = "MyApp.Generated"
//! include_paths = ["templates/include"]
//! transform = ["templates/*.tt"]
//!
//! [[parameters]]
//! name = "Count"
//! value = "42"
//!
//! [[directive_processors]]
//! name = "Props"
//! class = "PropsProcessor"
//! assembly = "props.dll"
//!
//! [[preprocess]]
//! input = "templates/Report.tt"
//! output = "src/generated/report.rs"
//! class_name = "Report"
//! ```
//!
//! Relative paths are resolved against the directory containing the file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::core::{FileOperation, FileResultExt, TtError};
use crate::snapshot::{
    BuildSnapshot, DirectiveProcessorRegistration, ParameterTuple, PreprocessRecord, TransformRecord,
};

/// A template to preprocess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreprocessEntry {
    /// Template path
    pub input: PathBuf,
    /// Generated source path
    pub output: PathBuf,
    /// Generated type name; derived from the file name when absent
    #[serde(default)]
    pub class_name: Option<String>,
    /// Namespace used when the template declares none
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Parsed `ttbuild.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Namespace for preprocessed templates that declare none
    #[serde(default)]
    pub default_namespace: Option<String>,
    /// Directories searched for included files
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    /// Reference search paths
    #[serde(default)]
    pub reference_paths: Vec<PathBuf>,
    /// Assembly references
    #[serde(default)]
    pub assembly_references: Vec<String>,
    /// Templates to transform: paths or glob patterns
    #[serde(default)]
    pub transform: Vec<String>,
    /// Templates to preprocess
    #[serde(default)]
    pub preprocess: Vec<PreprocessEntry>,
    /// Directive processors
    #[serde(default)]
    pub directive_processors: Vec<DirectiveProcessorRegistration>,
    /// Build parameters
    #[serde(default)]
    pub parameters: Vec<ParameterTuple>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl BuildConfig {
    /// Load and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`TtError::ConfigNotFound`] when the file does not exist and
    /// [`TtError::ConfigParseError`] when it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TtError::ConfigNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).with_file_context(
            FileOperation::Read,
            path,
            "reading build configuration",
            "config::load",
        )?;

        let mut config: Self = toml::from_str(&content).map_err(|e| TtError::ConfigParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;

        config.base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        tracing::debug!(
            transform = config.transform.len(),
            preprocess = config.preprocess.len(),
            "Loaded build configuration from {}",
            path.display()
        );
        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.base_dir.join(path))
        }
    }

    /// Expand transform patterns into template paths.
    ///
    /// Entries without glob metacharacters are taken literally, even when the
    /// file does not exist, so that a missing template is reported at build
    /// time. Glob matches are sorted. A template named by more than one entry
    /// is listed once, at its first position.
    ///
    /// # Errors
    ///
    /// Returns [`TtError::InvalidPattern`] for a malformed pattern.
    pub fn transform_inputs(&self) -> Result<Vec<PathBuf>> {
        let mut inputs = Vec::new();
        let mut seen = HashSet::new();

        for pattern in &self.transform {
            if !pattern.contains(['*', '?', '[']) {
                let path = self.resolve(Path::new(pattern));
                if seen.insert(path.clone()) {
                    inputs.push(path);
                } else {
                    tracing::debug!("Transform entry '{pattern}' is already listed");
                }
                continue;
            }

            let full = self.resolve(Path::new(pattern));
            let paths = glob::glob(&full.to_string_lossy()).map_err(|e| TtError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;

            let mut matches: Vec<PathBuf> = paths
                .filter_map(Result::ok)
                .filter(|p| p.is_file())
                .map(|p| normalize(&p))
                .collect();
            matches.sort();
            if matches.is_empty() {
                tracing::warn!("Transform pattern '{pattern}' matched no files");
            }
            for path in matches {
                if seen.insert(path.clone()) {
                    inputs.push(path);
                }
            }
        }

        Ok(inputs)
    }

    /// Build the current snapshot, appending `extra_parameters` after the
    /// configured ones so they take precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if a transform pattern is invalid.
    pub fn to_snapshot(&self, extra_parameters: &[ParameterTuple]) -> Result<BuildSnapshot> {
        let mut snapshot = BuildSnapshot::new();
        snapshot.default_namespace = self.default_namespace.clone().filter(|ns| !ns.is_empty());
        snapshot.include_paths = self.include_paths.iter().map(|p| self.resolve(p)).collect();
        snapshot.reference_paths = self.reference_paths.iter().map(|p| self.resolve(p)).collect();
        snapshot.assembly_references = self.assembly_references.clone();
        snapshot.directive_processors = self.directive_processors.clone();
        snapshot.parameters = self.parameters.iter().chain(extra_parameters).cloned().collect();

        snapshot.transforms = self.transform_inputs()?.into_iter().map(TransformRecord::new).collect();
        snapshot.preprocessed = self
            .preprocess
            .iter()
            .map(|entry| {
                let mut record = PreprocessRecord::new(self.resolve(&entry.input), self.resolve(&entry.output));
                record.class_name = entry.class_name.clone().filter(|c| !c.is_empty());
                record.namespace = entry.namespace.clone().filter(|ns| !ns.is_empty());
                record
            })
            .collect();

        Ok(snapshot)
    }
}

/// Drop `.` components so one file has one spelling: `./a.tt` and `a.tt`
/// must compare equal when deduplicating and when keying the build state.
fn normalize(path: &Path) -> PathBuf {
    let normalized: PathBuf = path.components().filter(|c| !matches!(c, Component::CurDir)).collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

/// Parse a `NAME=VALUE` command-line parameter.
///
/// # Errors
///
/// Returns [`TtError::InvalidParameterArgument`] when there is no `=` or the
/// name is empty.
pub fn parse_parameter_argument(argument: &str) -> Result<ParameterTuple, TtError> {
    match argument.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok(ParameterTuple {
            processor: String::new(),
            directive: String::new(),
            name: name.trim().to_string(),
            value: value.to_string(),
        }),
        _ => Err(TtError::InvalidParameterArgument {
            argument: argument.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_resolves_paths_and_globs() {
        let temp = tempdir().unwrap();
        let templates = temp.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("b.tt"), "b").unwrap();
        fs::write(templates.join("a.tt"), "a").unwrap();
        fs::write(templates.join("notes.md"), "").unwrap();

        let path = temp.path().join("ttbuild.toml");
        fs::write(
            &path,
            r#"
default_namespace = "MyApp.Generated"
include_paths = ["templates/include"]
transform = ["templates/*.tt", "templates/a.tt", "extra/missing.tt"]

[[parameters]]
name = "Count"
value = "1"

[[preprocess]]
input = "templates/Report.tt"
output = "src/report.rs"
namespace = ""
"#,
        )
        .unwrap();

        let config = BuildConfig::load(&path).unwrap();
        let overrides = [parse_parameter_argument("Count=2").unwrap()];
        let snapshot = config.to_snapshot(&overrides).unwrap();

        let inputs: Vec<_> = snapshot.transforms.iter().map(|t| t.input_file.clone()).collect();
        assert_eq!(
            inputs,
            vec![templates.join("a.tt"), templates.join("b.tt"), temp.path().join("extra/missing.tt")]
        );
        assert_eq!(snapshot.include_paths, vec![temp.path().join("templates/include")]);
        assert_eq!(snapshot.parameter_map().get("Count"), Some("2"));
        assert_eq!(snapshot.preprocessed[0].output_file, temp.path().join("src/report.rs"));
        assert_eq!(snapshot.preprocessed[0].namespace, None);
    }

    #[test]
    fn test_missing_and_invalid_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("ttbuild.toml");
        let err = BuildConfig::load(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<TtError>(), Some(TtError::ConfigNotFound { .. })));

        fs::write(&path, "transfrom = []\n").unwrap();
        let err = BuildConfig::load(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<TtError>(), Some(TtError::ConfigParseError { .. })));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = BuildConfig {
            transform: vec!["templates/[.tt".to_string()],
            base_dir: PathBuf::from("."),
            ..BuildConfig::default()
        };
        let err = config.to_snapshot(&[]).unwrap_err();
        assert!(matches!(err.downcast_ref::<TtError>(), Some(TtError::InvalidPattern { .. })));
    }

    #[test]
    fn test_normalize_drops_current_dir() {
        assert_eq!(normalize(Path::new("./a.tt")), PathBuf::from("a.tt"));
        assert_eq!(normalize(Path::new("./templates/./a.tt")), PathBuf::from("templates/a.tt"));
        assert_eq!(normalize(Path::new(".")), PathBuf::from("."));
        assert_eq!(normalize(Path::new("../a.tt")), PathBuf::from("../a.tt"));
    }

    #[test]
    fn test_glob_and_literal_share_one_spelling() {
        let temp = tempfile::tempdir_in(".").unwrap();
        let dir = temp.path().file_name().unwrap().to_string_lossy().into_owned();
        fs::write(temp.path().join("a.tt"), "a").unwrap();

        let config = BuildConfig {
            transform: vec![format!("{dir}/*.tt"), format!("./{dir}/a.tt")],
            base_dir: PathBuf::from("."),
            ..BuildConfig::default()
        };
        let snapshot = config.to_snapshot(&[]).unwrap();

        let inputs: Vec<_> = snapshot.transforms.iter().map(|t| t.input_file.clone()).collect();
        assert_eq!(inputs, vec![PathBuf::from(&dir).join("a.tt")]);

        let mut lookup = |_: &Path| -> std::io::Result<Option<std::time::SystemTime>> { Ok(None) };
        let work = crate::snapshot::compute_work(None, &snapshot, false, &mut lookup);
        assert_eq!(work.transforms.len(), 1);
    }

    #[test]
    fn test_parse_parameter_argument() {
        let tuple = parse_parameter_argument("Title=a=b").unwrap();
        assert_eq!((tuple.name.as_str(), tuple.value.as_str()), ("Title", "a=b"));
        assert!(parse_parameter_argument("Empty=").is_ok());
        assert!(parse_parameter_argument("novalue").is_err());
        assert!(parse_parameter_argument("=x").is_err());
    }
}
