//! Default values for git-form configuration.
//!
//! This module provides centralized default values used by the settings
//! loader and the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Directory below the home directory that holds the settings file.
pub const SETTINGS_DIR_NAME: &str = ".git-form";

/// Name of the settings file inside [`SETTINGS_DIR_NAME`].
pub const SETTINGS_FILE_NAME: &str = "settings.yaml";

/// Directory below the home directory scanned for repositories.
pub const ROOT_DIR_NAME: &str = "GIT";

/// Directory below the root that holds descriptor files.
pub const STORE_DIR_NAME: &str = "GitForm";

/// Returns the user's home directory.
///
/// Falls back to the current directory if the home directory cannot be
/// determined.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default discovery root, `~/GIT`.
///
/// This can be overridden in the settings file, by the `--root` CLI flag or
/// the `GIT_FORM_ROOT` environment variable.
pub fn default_root() -> PathBuf {
    home_dir().join(ROOT_DIR_NAME)
}

/// Returns the default descriptor store, `~/GIT/GitForm`.
///
/// This can be overridden in the settings file, by the `--store` CLI flag or
/// the `GIT_FORM_STORE` environment variable.
pub fn default_store() -> PathBuf {
    default_root().join(STORE_DIR_NAME)
}

/// Returns the default settings file, `~/.git-form/settings.yaml`.
pub fn default_settings_file() -> PathBuf {
    home_dir().join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME)
}
