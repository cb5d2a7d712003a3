//! Deciding which templates need processing.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::constants::DEFAULT_TRANSFORM_EXTENSION;
use crate::templating::codegen::sanitize_identifier;

use super::BuildSnapshot;

/// A template to transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformItem {
    /// Template path
    pub input_file: PathBuf,
    /// Intended output path; the generator may change the extension
    pub output_file: PathBuf,
    /// Index of the record in the current snapshot's transforms
    pub record: usize,
}

/// A template to preprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessItem {
    /// Template path
    pub input_file: PathBuf,
    /// Generated source path
    pub output_file: PathBuf,
    /// Name of the generated type
    pub class_name: String,
    /// Namespace override from the record
    pub namespace: Option<String>,
    /// Index of the record in the current snapshot's preprocess list
    pub record: usize,
}

/// Templates that need processing in this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkLists {
    /// Templates to transform
    pub transforms: Vec<TransformItem>,
    /// Templates to preprocess
    pub preprocessed: Vec<PreprocessItem>,
}

impl WorkLists {
    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty() && self.preprocessed.is_empty()
    }

    /// Total number of items.
    pub fn len(&self) -> usize {
        self.transforms.len() + self.preprocessed.len()
    }
}

/// Write time lookup; `Ok(None)` means the file does not exist.
pub type WriteTimeLookup<'a> = dyn FnMut(&Path) -> io::Result<Option<SystemTime>> + 'a;

/// Class name derived from a template's file name.
pub fn default_class_name(input_file: &Path) -> String {
    let stem = input_file.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    sanitize_identifier(&stem)
}

/// Partition the current snapshot's templates into stale work lists.
///
/// A template is stale when it is new, when its last output is unknown or
/// missing, or when the template or any dependency recorded for it is
/// missing or newer than the output. A change to any run-wide setting makes
/// every template stale. A template listed for both modes is only
/// preprocessed, and a template listed twice in one mode is processed once.
pub fn compute_work(
    previous: Option<&BuildSnapshot>,
    current: &BuildSnapshot,
    preprocess_only: bool,
    lookup: &mut WriteTimeLookup<'_>,
) -> WorkLists {
    let settings_changed = previous.is_none_or(|p| !p.settings_match(current));
    if settings_changed && previous.is_some() {
        tracing::info!("Build settings changed; all templates will be processed");
    }

    let mut work = WorkLists::default();
    let mut preprocess_inputs: HashSet<&Path> = HashSet::new();

    for (index, record) in current.preprocessed.iter().enumerate() {
        if !preprocess_inputs.insert(record.input_file.as_path()) {
            tracing::warn!("'{}' is listed for preprocessing more than once", record.input_file.display());
            continue;
        }

        let stale = match previous.and_then(|p| p.preprocess_record(&record.input_file)) {
            _ if settings_changed => true,
            None => true,
            Some(prev) => {
                !prev.generated
                    || prev.output_file != record.output_file
                    || prev.class_name != record.class_name
                    || prev.namespace != record.namespace
                    || is_out_of_date(&record.input_file, &record.output_file, &prev.dependencies, lookup)
            }
        };

        if stale {
            work.preprocessed.push(PreprocessItem {
                input_file: record.input_file.clone(),
                output_file: record.output_file.clone(),
                class_name: record.class_name.clone().unwrap_or_else(|| default_class_name(&record.input_file)),
                namespace: record.namespace.clone(),
                record: index,
            });
        } else {
            tracing::debug!("Up to date: {}", record.input_file.display());
        }
    }

    if preprocess_only {
        return work;
    }

    let mut transform_inputs: HashSet<&Path> = HashSet::new();
    for (index, record) in current.transforms.iter().enumerate() {
        if preprocess_inputs.contains(record.input_file.as_path()) {
            tracing::warn!(
                "'{}' is listed for both transform and preprocess; preprocessing only",
                record.input_file.display()
            );
            continue;
        }
        if !transform_inputs.insert(record.input_file.as_path()) {
            tracing::warn!("'{}' is listed for transform more than once", record.input_file.display());
            continue;
        }

        let prev = previous.and_then(|p| p.transform_record(&record.input_file));
        let stale = match prev.and_then(|p| p.output_file.as_deref().map(|out| (p, out))) {
            _ if settings_changed => true,
            None => true,
            Some((prev, output)) => is_out_of_date(&record.input_file, output, &prev.dependencies, lookup),
        };

        if stale {
            work.transforms.push(TransformItem {
                input_file: record.input_file.clone(),
                output_file: record.input_file.with_extension(DEFAULT_TRANSFORM_EXTENSION),
                record: index,
            });
        } else {
            tracing::debug!("Up to date: {}", record.input_file.display());
        }
    }

    work
}

/// Whether `output` is missing or older than the input or a dependency.
fn is_out_of_date(
    input: &Path,
    output: &Path,
    dependencies: &[PathBuf],
    lookup: &mut WriteTimeLookup<'_>,
) -> bool {
    let output_time = match lookup(output) {
        Ok(Some(time)) => time,
        Ok(None) => return true,
        Err(e) => {
            tracing::warn!("Cannot read write time of {}: {e}", output.display());
            return true;
        }
    };

    std::iter::once(input).chain(dependencies.iter().map(PathBuf::as_path)).any(|source| {
        match lookup(source) {
            Ok(Some(time)) => time > output_time,
            Ok(None) => true,
            Err(e) => {
                tracing::warn!("Cannot read write time of {}: {e}", source.display());
                true
            }
        }
    })
}
