//! Command-line interface for ttbuild.
//!
//! # Commands
//!
//! - `build` - process every stale template and save the build state
//! - `status` - list the templates a build would process
//!
//! # Usage
//!
//! ```bash
//! # Build using ./ttbuild.toml
//! ttbuild build
//!
//! # Override a parameter and rebuild everything
//! ttbuild build --param Count=42 --force
//!
//! # Only regenerate preprocessed generator code
//! ttbuild build --preprocess-only
//!
//! # Show what is out of date
//! ttbuild --config templates/ttbuild.toml status
//! ```
//!
//! The process exits with status 1 when any template fails.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::{BuildConfig, parse_parameter_argument};
use crate::constants::{CONFIG_ENV_VAR, CONFIG_FILE_NAME, STATE_FILE};
use crate::log::TracingBuildLog;
use crate::processor::{RunReport, TransformProcessor};
use crate::snapshot::{BuildSnapshot, ParameterTuple};
use crate::templating::TeraGenerator;
use crate::utils::fs::LiveFileSystem;

/// Incremental text-template transformation
#[derive(Parser, Debug)]
#[command(
    name = "ttbuild",
    about = "Incremental text-template transformation for build pipelines",
    version,
    long_about = "ttbuild renders text templates and preprocesses them into Rust generator code, \
                  processing only the templates whose sources, includes or settings changed since \
                  the last build."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors and suppress the summary
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the build configuration
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process every stale template and save the build state
    Build {
        /// Build state file [default: .ttbuild/state.toml next to the configuration]
        #[arg(long)]
        state: Option<PathBuf>,

        /// Additional build parameter, NAME=VALUE (repeatable; later values win)
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Only preprocess templates; skip transforms
        #[arg(long)]
        preprocess_only: bool,

        /// Ignore the saved build state and process every template
        #[arg(long)]
        force: bool,
    },

    /// List templates that would be processed
    Status {
        /// Build state file [default: .ttbuild/state.toml next to the configuration]
        #[arg(long)]
        state: Option<PathBuf>,

        /// Build parameter the next build will be given, NAME=VALUE (repeatable)
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Only consider templates to preprocess
        #[arg(long)]
        preprocess_only: bool,
    },
}

impl Cli {
    /// Run the selected command.
    ///
    /// Returns `Ok(false)` when the command ran but at least one template
    /// failed; `Err` is reserved for failures that stop the run entirely,
    /// such as an unreadable configuration.
    pub fn execute(self) -> Result<bool> {
        init_logging(self.verbose, self.quiet);

        let config_path = self.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        let config = BuildConfig::load(&config_path)?;

        match self.command {
            Commands::Build {
                state,
                params,
                preprocess_only,
                force,
            } => {
                let extra = parse_parameter_arguments(&params)?;
                let state_path = state.unwrap_or_else(|| config.base_dir.join(STATE_FILE));
                let report = build(&config, &extra, &state_path, preprocess_only, force)?;
                if !self.quiet {
                    print_summary(&report);
                }
                Ok(report.is_success())
            }
            Commands::Status {
                state,
                params,
                preprocess_only,
            } => {
                let extra = parse_parameter_arguments(&params)?;
                let state_path = state.unwrap_or_else(|| config.base_dir.join(STATE_FILE));
                status(&config, &extra, &state_path, preprocess_only)?;
                Ok(true)
            }
        }
    }
}

fn parse_parameter_arguments(params: &[String]) -> Result<Vec<ParameterTuple>> {
    Ok(params.iter().map(|p| parse_parameter_argument(p)).collect::<Result<Vec<_>, _>>()?)
}

/// Install the stderr subscriber. `RUST_LOG` wins over the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

fn build(
    config: &BuildConfig,
    extra_parameters: &[ParameterTuple],
    state_path: &Path,
    preprocess_only: bool,
    force: bool,
) -> Result<RunReport> {
    let previous = if force {
        tracing::debug!("--force given, ignoring saved build state");
        None
    } else {
        BuildSnapshot::load(state_path)?
    };
    let mut current = config.to_snapshot(extra_parameters)?;

    let mut log = TracingBuildLog::new();
    let report = {
        let mut processor = TransformProcessor::new(&mut log, LiveFileSystem);
        processor.process(previous.as_ref(), &mut current, preprocess_only, |generator_config| {
            TeraGenerator::new(generator_config, LiveFileSystem)
        })
    };

    if previous.as_ref() == Some(&current) {
        tracing::debug!("Build state unchanged, not rewriting {}", state_path.display());
    } else {
        current.save(state_path)?;
    }
    tracing::debug!(errors = log.error_count(), warnings = log.warning_count(), "Build finished");
    Ok(report)
}

fn status(
    config: &BuildConfig,
    extra_parameters: &[ParameterTuple],
    state_path: &Path,
    preprocess_only: bool,
) -> Result<()> {
    let previous = BuildSnapshot::load(state_path)?;
    let current = config.to_snapshot(extra_parameters)?;

    let mut log = TracingBuildLog::new();
    let processor = TransformProcessor::new(&mut log, LiveFileSystem);
    let work = processor.plan(previous.as_ref(), &current, preprocess_only);

    if work.is_empty() {
        println!("{}", "All templates are up to date".green());
        return Ok(());
    }

    for item in &work.transforms {
        println!("{} {}", "transform ".cyan(), item.input_file.display());
    }
    for item in &work.preprocessed {
        println!("{} {} ({})", "preprocess".cyan(), item.input_file.display(), item.class_name);
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    let processed = report.transformed + report.preprocessed;
    if report.is_success() {
        println!(
            "{} {} template(s) processed, {} up to date",
            "✓".green().bold(),
            processed,
            report.skipped
        );
    } else {
        println!(
            "{} {} template(s) failed, {} processed, {} up to date",
            "✗".red().bold(),
            report.failed,
            processed,
            report.skipped
        );
    }
}
