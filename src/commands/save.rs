//! # Save Command Implementation
//!
//! This module implements the `save` subcommand, which walks the root
//! directory and writes one descriptor file per repository into the store.
//!
//! Descriptor files are never overwritten: repositories saved by an earlier
//! run are listed under `Project already exists:` instead. Delete a file from
//! the store to record its repository again.

use anyhow::Result;
use clap::Args;
use git_form::output::OutputConfig;
use git_form::settings::Settings;
use git_form::sync;
use log::debug;

use super::LocationArgs;

/// Record every repository below the root directory in the store
#[derive(Args, Debug)]
pub struct SaveArgs {
    #[command(flatten)]
    pub location: LocationArgs,
}

/// Execute the `save` command.
pub fn execute(args: SaveArgs, settings: &Settings, output: &OutputConfig) -> Result<()> {
    let (root, store) = args.location.resolve(settings);
    debug!("save: root={} store={}", root.display(), store.display());

    let report = sync::save(&root, &store);
    super::finish(&report, output)
}
