//! Common test utilities for ttbuild integration tests
//!
//! [`TestProject`] owns a temporary project directory, writes templates and
//! configuration into it and runs the `ttbuild` binary there.

// Allow dead code because not every helper is used by every test module
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// A temporary ttbuild project.
pub struct TestProject {
    _temp_dir: TempDir,
    project_dir: PathBuf,
}

impl TestProject {
    /// Create an empty project.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let project_dir = temp_dir.path().to_path_buf();
        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    /// The project root.
    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    /// Absolute path of a project-relative file.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.project_dir.join(relative)
    }

    /// Write a project file, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write `ttbuild.toml`.
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        self.write_file("ttbuild.toml", content)
    }

    /// Read a project file.
    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
    }

    /// Move a file's modification time `seconds` into the future.
    pub fn touch_ahead(&self, relative: &str, seconds: u64) -> Result<()> {
        let file = fs::File::options().write(true).open(self.path(relative))?;
        file.set_modified(SystemTime::now() + Duration::from_secs(seconds))?;
        Ok(())
    }

    /// Run ttbuild in the project directory.
    pub fn run_ttbuild(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::cargo_bin("ttbuild")?
            .args(args)
            .current_dir(&self.project_dir)
            .env_remove("TTBUILD_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .output()
            .context("Failed to run ttbuild")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStdout: {}\nStderr: {}",
            self.code, self.stdout, self.stderr
        );
        self
    }

    /// Assert the command exited with status 1
    pub fn assert_failure(&self) -> &Self {
        assert_eq!(self.code, Some(1), "Expected exit code 1\nStderr: {}", self.stderr);
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    /// Assert stderr contains the given text
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}

/// File assertion helpers
pub struct FileAssert;

impl FileAssert {
    /// Assert a file exists
    pub fn exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// Assert a file does not exist
    pub fn not_exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(!path.exists(), "Expected file to not exist: {}", path.display());
    }

    /// Assert a file contains specific content
    pub fn contains(path: impl AsRef<Path>, expected: &str) {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
        assert!(
            content.contains(expected),
            "Expected file {} to contain '{}'\nActual content: {}",
            path.display(),
            expected,
            content
        );
    }

    /// Assert a file has exact content
    pub fn equals(path: impl AsRef<Path>, expected: &str) {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
        assert_eq!(content, expected, "File {} content mismatch", path.display());
    }
}

/// Modification time of a file.
pub fn modified(path: impl AsRef<Path>) -> SystemTime {
    let path = path.as_ref();
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or_else(|e| panic!("Failed to stat {}: {}", path.display(), e))
}
