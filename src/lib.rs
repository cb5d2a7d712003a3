//! ttbuild - incremental text-template transformation
//!
//! ttbuild takes a batch of text templates, decides which of them are out of
//! date against the previous build, and processes only those. Each template
//! is either **transformed** (rendered straight to an output file) or
//! **preprocessed** (compiled into Rust source for a generator type that
//! renders the template at runtime).
//!
//! # Architecture Overview
//!
//! - `ttbuild.toml` lists the templates and the run-wide settings
//! - `.ttbuild/state.toml` records what the last build produced
//! - one failing template never stops the rest of the batch; failures are
//!   logged with file, line and column and turn the exit status to 1
//!
//! # Core Modules
//!
//! - [`processor`] - the build driver
//! - [`snapshot`] - build snapshots, persisted state and staleness
//! - [`templating`] - directive parsing, parameter coercion, Tera rendering
//!   and Rust code generation
//! - [`log`] - the build log sink
//!
//! ## Supporting Modules
//!
//! - [`config`] - `ttbuild.toml` parsing
//! - [`cli`] - command-line interface
//! - [`core`] - error types and user-facing error formatting
//! - [`utils`] - file system access, atomic writes and the write-time cache
//! - [`constants`] - shared names and limits
//!
//! # Template Example
//!
//! ```text
//! <#@ template language="Rust" #>
//! <#@ output extension=".md" #>
//! <#@ parameter name="Count" type="int" #>
//! There are {{ Count }} items.
//! ```
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use ttbuild::log::TracingBuildLog;
//! use ttbuild::processor::TransformProcessor;
//! use ttbuild::snapshot::{BuildSnapshot, TransformRecord};
//! use ttbuild::templating::TeraGenerator;
//! use ttbuild::utils::fs::LiveFileSystem;
//!
//! let mut current = BuildSnapshot::new();
//! current.transforms.push(TransformRecord::new("greeting.tt"));
//!
//! let mut log = TracingBuildLog::new();
//! let mut processor = TransformProcessor::new(&mut log, LiveFileSystem);
//! let report = processor.process(None, &mut current, false, |config| {
//!     TeraGenerator::new(config, LiveFileSystem)
//! });
//! assert!(report.is_success());
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod log;
pub mod processor;
pub mod snapshot;
pub mod templating;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
