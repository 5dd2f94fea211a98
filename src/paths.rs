//! Run-directory initialization and timestamp helpers.

use crate::config::Config;
use crate::error::ResolveError;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the canonical config file written into a run directory.
pub const RUN_CONFIG_FILE: &str = "cfg.yml";

/// Local-time timestamp for run-directory names.
pub fn timestamp(include_date: bool, include_micros: bool) -> String {
    let format = match (include_date, include_micros) {
        (true, true) => "%Y-%m-%d_%H-%M-%S-%6f",
        (true, false) => "%Y-%m-%d_%H-%M-%S",
        (false, true) => "%H-%M-%S-%6f",
        (false, false) => "%H-%M-%S",
    };
    Local::now().format(format).to_string()
}

impl Config {
    /// Create a run directory under `base`, named after the description (or
    /// the attached identity, or `run`) plus an optional timestamp suffix,
    /// and seed it with this tree's canonical text.
    pub fn init_run_dir(
        &self,
        base: impl AsRef<Path>,
        timestamp: Option<&str>,
    ) -> Result<PathBuf, ResolveError> {
        let mut name = self
            .description()
            .or_else(|| self.identity())
            .unwrap_or("run")
            .to_string();
        if let Some(suffix) = timestamp {
            name.push('_');
            name.push_str(suffix);
        }
        let dir = base.as_ref().join(name);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(RUN_CONFIG_FILE), self.to_string())?;
        info!(dir = %dir.display(), "initialized run directory");
        Ok(dir)
    }
}
