//! Config (C13): validates CLI-supplied settings into one struct so
//! `run_single`/`run_batch` don't take a handful of positional parameters.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::format::Format;

/// Validated run configuration. Built once at startup by the CLI
/// collaborator (`src/main.rs`) and threaded through the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub format: Format,
    pub jobs: usize,
    pub output_root: PathBuf,
    pub dry_run: bool,
}

impl Config {
    /// Validates that `jobs >= 1` and that `output_root` is usable
    /// (either it exists, or its parent does and it can be created).
    pub fn new(
        format: Format,
        jobs: usize,
        output_root: PathBuf,
        dry_run: bool,
    ) -> Result<Config, ConfigError> {
        if jobs == 0 {
            return Err(ConfigError::InvalidJobCount(jobs));
        }

        if !output_root.exists() {
            let parent_writable = output_root
                .parent()
                .map(|p| p.as_os_str().is_empty() || p.exists())
                .unwrap_or(false);
            if !parent_writable {
                return Err(ConfigError::OutputRootUnwritable(output_root));
            }
        }

        Ok(Config {
            format,
            jobs,
            output_root,
            dry_run,
        })
    }
}
