//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `git-form` command-line tool, one file per command.
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args`, calls into the
//!   `git_form` library and prints the resulting report.
//!
//! `save` and `load` fail with exit code 1 when their report is unsuccessful,
//! after the report has been printed.

use std::path::PathBuf;

use anyhow::{bail, Result};
use git_form::output::{format_report, OutputConfig};
use git_form::report::ResultReport;
use git_form::settings::Settings;

pub mod completions;
pub mod load;
pub mod save;

/// Prints `report` to stdout and fails if it is unsuccessful.
pub(crate) fn finish(report: &ResultReport, output: &OutputConfig) -> Result<()> {
    println!("{}", format_report(output, report));
    if !report.is_successful() {
        bail!("{} failed", report.objective());
    }
    Ok(())
}

/// Directory options shared by `save` and `load`.
#[derive(clap::Args, Debug, Default)]
pub struct LocationArgs {
    /// Directory scanned for repositories and cloned into.
    ///
    /// Overrides the `git` setting. Can also be set with the `GIT_FORM_ROOT`
    /// environment variable.
    #[arg(long, value_name = "DIR", env = "GIT_FORM_ROOT")]
    pub root: Option<PathBuf>,

    /// Directory holding the descriptor files.
    ///
    /// Overrides the `git-form` setting. Can also be set with the
    /// `GIT_FORM_STORE` environment variable.
    #[arg(long, value_name = "DIR", env = "GIT_FORM_STORE")]
    pub store: Option<PathBuf>,
}

impl LocationArgs {
    /// Root and store directories, flags first, settings second.
    pub fn resolve(self, settings: &Settings) -> (PathBuf, PathBuf) {
        (
            self.root.unwrap_or_else(|| settings.root.clone()),
            self.store.unwrap_or_else(|| settings.store.clone()),
        )
    }
}
