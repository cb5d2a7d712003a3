//! The transform/preprocess driver.
//!
//! [`TransformProcessor::process`] runs one incremental build:
//!
//! 1. compute the stale work lists from the previous and current snapshots
//! 2. create the generator and register directive processors and parameters
//! 3. for each stale template: load, parse, coerce parameters, render or
//!    preprocess, write
//! 4. record outputs and dependencies in the current snapshot
//!
//! Every per-template problem is reported through the [`BuildLog`] and marks
//! only that template as failed; the rest of the batch still runs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::{FileOperation, FileResultExt};
use crate::log::{BuildLog, LocatedMessage};
use crate::snapshot::{BuildSnapshot, PreprocessItem, TransformItem, WorkLists, compute_work};
use crate::templating::{
    GeneratorConfig, ParameterMap, TemplateGenerator, coerce_parameters, encode_output, log_and_clear,
};
use crate::utils::fs::{FileSystem, WriteTimeCache};

/// Counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Templates transformed successfully
    pub transformed: usize,
    /// Templates preprocessed successfully
    pub preprocessed: usize,
    /// Templates that failed
    pub failed: usize,
    /// Templates that were up to date or not selected
    pub skipped: usize,
}

impl RunReport {
    /// Whether every processed template succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// What processing one template produced.
#[derive(Debug)]
enum ItemOutcome {
    Done(ItemOutput),
    Failed,
}

#[derive(Debug)]
struct ItemOutput {
    output_file: PathBuf,
    dependencies: Vec<PathBuf>,
}

/// Drives one build over a batch of templates.
pub struct TransformProcessor<'a, F: FileSystem> {
    log: &'a mut dyn BuildLog,
    fs: F,
}

impl<'a, F: FileSystem> TransformProcessor<'a, F> {
    /// Create a processor reporting to `log` and touching the disk through `fs`.
    pub fn new(log: &'a mut dyn BuildLog, fs: F) -> Self {
        Self {
            log,
            fs,
        }
    }

    /// Compute the stale work lists without processing anything.
    pub fn plan(
        &self,
        previous: Option<&BuildSnapshot>,
        current: &BuildSnapshot,
        preprocess_only: bool,
    ) -> WorkLists {
        let mut cache = WriteTimeCache::new(&self.fs);
        let work = compute_work(previous, current, preprocess_only, &mut |path: &Path| {
            cache.write_time(path)
        });
        let (hits, misses) = cache.stats();
        tracing::debug!(hits, misses, "Write time lookups");
        work
    }

    /// Process every stale template and update `current` with the results.
    ///
    /// `make_generator` is only called when there is work to do. The returned
    /// report is successful when no template failed.
    pub fn process<G, M>(
        &mut self,
        previous: Option<&BuildSnapshot>,
        current: &mut BuildSnapshot,
        preprocess_only: bool,
        make_generator: M,
    ) -> RunReport
    where
        G: TemplateGenerator,
        M: FnOnce(GeneratorConfig) -> G,
    {
        let work = self.plan(previous, current, preprocess_only);
        let total = current.transforms.len() + current.preprocessed.len();
        let mut report = RunReport {
            skipped: total - work.len(),
            ..RunReport::default()
        };

        carry_forward(previous, current, &work);

        if work.is_empty() {
            tracing::info!("All {total} templates are up to date");
            return report;
        }

        let mut generator = make_generator(current.generator_config());
        for registration in &current.directive_processors {
            generator.add_directive_processor(registration);
        }
        for parameter in &current.parameters {
            generator.add_parameter(parameter);
        }
        let parameters = current.parameter_map();

        for item in &work.transforms {
            tracing::debug!("Transforming {}", item.input_file.display());
            let record = &mut current.transforms[item.record];
            match self.transform(&mut generator, item, &parameters) {
                ItemOutcome::Done(output) => {
                    report.transformed += 1;
                    record.output_file = Some(output.output_file);
                    record.dependencies = output.dependencies;
                }
                ItemOutcome::Failed => {
                    report.failed += 1;
                    record.output_file = None;
                    record.dependencies.clear();
                }
            }
        }

        let default_namespace = current.default_namespace.clone();
        let mut generated_types = HashSet::new();
        for item in &work.preprocessed {
            tracing::debug!("Preprocessing {} as {}", item.input_file.display(), item.class_name);
            let outcome =
                self.preprocess(&mut generator, item, default_namespace.as_deref(), &mut generated_types);
            let record = &mut current.preprocessed[item.record];
            match outcome {
                ItemOutcome::Done(output) => {
                    report.preprocessed += 1;
                    record.generated = true;
                    record.dependencies = output.dependencies;
                }
                ItemOutcome::Failed => {
                    report.failed += 1;
                    record.generated = false;
                    record.dependencies.clear();
                }
            }
        }

        tracing::info!(
            "Processed {} templates: {} transformed, {} preprocessed, {} failed, {} up to date",
            work.len(),
            report.transformed,
            report.preprocessed,
            report.failed,
            report.skipped
        );
        report
    }

    fn transform<G: TemplateGenerator>(
        &mut self,
        generator: &mut G,
        item: &TransformItem,
        parameters: &ParameterMap,
    ) -> ItemOutcome {
        let input = item.input_file.as_path();
        let Some(content) = self.load_source(input) else {
            return ItemOutcome::Failed;
        };

        let mut template = generator.parse(input, &content);
        let settings = generator.settings(&mut template);
        if !parameters.is_empty() {
            let (session, converters) = generator.session_with_converters();
            coerce_parameters(&mut template, parameters, session, converters);
        }
        if log_and_clear(&mut *self.log, &mut template.errors, input) {
            return ItemOutcome::Failed;
        }

        let rendered = generator.process_template(&template, input, &content, &item.output_file, &settings);
        if log_and_clear(&mut *self.log, generator.errors_mut(), input) {
            return ItemOutcome::Failed;
        }
        let Some(rendered) = rendered else {
            self.log.error(&format!("Template '{}' produced no output", input.display()));
            return ItemOutcome::Failed;
        };

        if !self.write_output(&rendered.path, &encode_output(&rendered.text, settings.encoding)) {
            return ItemOutcome::Failed;
        }

        ItemOutcome::Done(ItemOutput {
            output_file: rendered.path,
            dependencies: template.dependencies,
        })
    }

    fn preprocess<G: TemplateGenerator>(
        &mut self,
        generator: &mut G,
        item: &PreprocessItem,
        default_namespace: Option<&str>,
        generated_types: &mut HashSet<(String, String)>,
    ) -> ItemOutcome {
        let input = item.input_file.as_path();
        let Some(content) = self.load_source(input) else {
            return ItemOutcome::Failed;
        };

        let mut template = generator.parse(input, &content);
        let mut settings = generator.settings(&mut template);
        if log_and_clear(&mut *self.log, &mut template.errors, input) {
            return ItemOutcome::Failed;
        }

        let namespace = settings
            .namespace
            .clone()
            .or_else(|| item.namespace.clone())
            .or_else(|| default_namespace.map(str::to_string))
            .filter(|ns| !ns.is_empty());
        if !generated_types.insert((namespace.clone().unwrap_or_default(), item.class_name.clone())) {
            self.log.warning_at(&LocatedMessage {
                code: None,
                file: item.input_file.clone(),
                line: 0,
                column: 0,
                message: format!(
                    "Type '{}' in namespace '{}' is generated by more than one template",
                    item.class_name,
                    namespace.as_deref().unwrap_or_default()
                ),
            });
        }
        settings.namespace = namespace;

        let code = generator.preprocess_template(&template, input, &content, &item.class_name, &settings);
        if log_and_clear(&mut *self.log, generator.errors_mut(), input) {
            return ItemOutcome::Failed;
        }
        let Some(code) = code else {
            self.log.error(&format!("Template '{}' produced no output", input.display()));
            return ItemOutcome::Failed;
        };

        if !self.write_output(&item.output_file, &encode_output(&code, settings.encoding)) {
            return ItemOutcome::Failed;
        }

        ItemOutcome::Done(ItemOutput {
            output_file: item.output_file.clone(),
            dependencies: template.dependencies,
        })
    }

    /// Read a template, logging why it could not be read.
    fn load_source(&mut self, input: &Path) -> Option<String> {
        if !self.fs.exists(input) {
            self.log.error(&format!("Template file '{}' does not exist", input.display()));
            return None;
        }

        match self.fs.read_to_string(input).with_file_context(
            FileOperation::Read,
            input,
            "loading template source",
            "processor::load_source",
        ) {
            Ok(content) => Some(content),
            Err(e) => {
                self.log.error_from_file_operation(&e);
                None
            }
        }
    }

    /// Write an output file, logging a failure against it.
    fn write_output(&mut self, path: &Path, contents: &[u8]) -> bool {
        match self.fs.write(path, contents).with_file_context(
            FileOperation::Write,
            path,
            "writing template output",
            "processor::write_output",
        ) {
            Ok(()) => {
                tracing::debug!("Wrote {} ({} bytes)", path.display(), contents.len());
                true
            }
            Err(e) => {
                self.log.error_from_file_operation(&e);
                false
            }
        }
    }
}

/// Copy the previous results of templates that are not processed this run.
///
/// Nothing is carried over when run-wide settings changed, so those
/// templates stay stale until they are processed under the new settings.
fn carry_forward(previous: Option<&BuildSnapshot>, current: &mut BuildSnapshot, work: &WorkLists) {
    let previous = match previous {
        Some(previous) if previous.settings_match(current) => previous,
        _ => return,
    };

    let queued: HashSet<usize> = work.transforms.iter().map(|t| t.record).collect();
    for (index, record) in current.transforms.iter_mut().enumerate() {
        if queued.contains(&index) {
            continue;
        }
        if let Some(prev) = previous.transform_record(&record.input_file) {
            record.output_file = prev.output_file.clone();
            record.dependencies = prev.dependencies.clone();
        }
    }

    let queued: HashSet<usize> = work.preprocessed.iter().map(|p| p.record).collect();
    for (index, record) in current.preprocessed.iter_mut().enumerate() {
        if queued.contains(&index) {
            continue;
        }
        if let Some(prev) = previous.preprocess_record(&record.input_file) {
            record.generated = prev.generated && prev.output_file == record.output_file;
            record.dependencies = prev.dependencies.clone();
        }
    }
}
