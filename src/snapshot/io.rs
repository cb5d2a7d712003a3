//! Loading and saving the persisted build state.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::constants::STATE_VERSION;
use crate::core::{FileOperation, FileResultExt, TtError};
use crate::utils::fs::atomic_write;

use super::BuildSnapshot;

const HEADER: &str = "# Auto-generated by ttbuild - DO NOT EDIT\n";

impl BuildSnapshot {
    /// Load the snapshot saved by a previous run.
    ///
    /// A missing or empty file means there was no previous run and yields
    /// `Ok(None)`. A snapshot written by a newer ttbuild is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or has
    /// an unsupported version.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::debug!("No build state at {}, treating as first run", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).with_file_context(
            FileOperation::Read,
            path,
            "loading build state",
            "snapshot::io::load",
        )?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let snapshot: Self = toml::from_str(&content).map_err(|e| TtError::StateParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if snapshot.version > STATE_VERSION {
            return Err(TtError::StateVersionMismatch {
                found: snapshot.version,
                supported: STATE_VERSION,
            }
            .into());
        }

        Ok(Some(snapshot))
    }

    /// Save the snapshot atomically, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = String::from(HEADER);
        content.push_str(&toml::to_string(self).context("Failed to serialize build state")?);

        atomic_write(path, content.as_bytes())
            .with_file_context(FileOperation::Write, path, "saving build state", "snapshot::io::save")?;

        tracing::debug!("Saved build state to {}", path.display());
        Ok(())
    }
}
