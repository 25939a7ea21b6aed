//! # Settings
//!
//! Persistent user settings, read from `~/.git-form/settings.yaml`:
//!
//! ```yaml
//! git: /home/user/GIT
//! git-form: /home/user/GIT/GitForm
//! max-parallel-clones: 8
//! clone-timeout-secs: 600
//! ```
//!
//! Every key is optional and falls back to its default. On first use the file
//! is created with the default values so users have something to edit.
//! Command-line flags and environment variables take precedence over the file;
//! that layering happens in the CLI, this module only deals with the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::orchestrator::{CloneOptions, DEFAULT_MAX_PARALLEL, DEFAULT_TIMEOUT};

/// User settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Directory scanned for repositories and cloned into.
    #[serde(rename = "git")]
    pub root: PathBuf,
    /// Directory holding the descriptor files.
    #[serde(rename = "git-form")]
    pub store: PathBuf,
    pub max_parallel_clones: usize,
    /// Per-clone time limit in seconds, `0` disables it.
    pub clone_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: defaults::default_root(),
            store: defaults::default_store(),
            max_parallel_clones: DEFAULT_MAX_PARALLEL,
            clone_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    /// Parses settings from YAML. An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reads settings from an existing file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| settings_error(path, e))?;
        Self::from_yaml(&content).map_err(|e| settings_error(path, e))
    }

    /// Reads settings from `path`, writing a default file there first if none
    /// exists.
    ///
    /// If the settings directory exists but is not a directory the defaults
    /// are returned and nothing is written.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.is_file() {
            debug!("Reading settings from {}", path.display());
            return Self::load(path);
        }

        let settings = Self::default();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if dir.exists() && !dir.is_dir() {
                warn!(
                    "{} should be a directory, using default settings",
                    dir.display()
                );
                return Ok(settings);
            }
            fs::create_dir_all(dir).map_err(|e| settings_error(path, e))?;
        }

        fs::write(path, settings.to_yaml()?).map_err(|e| settings_error(path, e))?;
        debug!("Wrote default settings to {}", path.display());
        Ok(settings)
    }

    /// The per-clone time limit, `None` when disabled.
    pub fn clone_timeout(&self) -> Option<Duration> {
        match self.clone_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Orchestrator limits derived from these settings.
    pub fn clone_options(&self) -> CloneOptions {
        CloneOptions {
            max_parallel: self.max_parallel_clones,
            timeout: self.clone_timeout(),
            ..CloneOptions::default()
        }
    }
}

fn settings_error(path: &Path, error: impl std::fmt::Display) -> Error {
    Error::Settings {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
