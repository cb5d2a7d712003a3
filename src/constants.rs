//! Global constants used throughout the ttbuild codebase.
//!
//! File names, format versions and limits that more than one module needs.
//! Defining them centrally keeps the CLI, the configuration loader and the
//! processor in agreement.

/// Name of the build configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "ttbuild.toml";

/// Default location of the persisted build snapshot, relative to the
/// configuration file's directory.
pub const STATE_FILE: &str = ".ttbuild/state.toml";

/// Snapshot format version written by this build.
///
/// Snapshots with a higher version are rejected rather than misread.
pub const STATE_VERSION: u32 = 1;

/// Extension used for transform outputs when the template does not set one.
pub const DEFAULT_TRANSFORM_EXTENSION: &str = "txt";

/// Maximum nesting of `include` directives.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Environment variable that overrides the configuration file path.
pub const CONFIG_ENV_VAR: &str = "TTBUILD_CONFIG";
