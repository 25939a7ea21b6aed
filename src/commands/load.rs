//! # Load Command Implementation
//!
//! This module implements the `load` subcommand, which reads every descriptor
//! file in the store and clones the repositories that do not exist below the
//! root directory yet.
//!
//! Clones run in parallel, limited by `--jobs` (or the `max-parallel-clones`
//! setting). A clone that takes longer than `--timeout` seconds (or the
//! `clone-timeout-secs` setting) is stopped and its partial checkout removed.
//! Repositories that already exist are left untouched, so `load` can be run
//! again after a partial failure.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use git_form::orchestrator::{CloneOptions, CloneOrchestrator};
use git_form::output::OutputConfig;
use git_form::settings::Settings;
use git_form::sync;
use log::debug;

use super::LocationArgs;

/// Clone every repository recorded in the store that is missing locally
#[derive(Args, Debug)]
pub struct LoadArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Maximum number of clones running at the same time.
    ///
    /// Can also be set with the `GIT_FORM_JOBS` environment variable.
    #[arg(
        short,
        long,
        value_name = "N",
        env = "GIT_FORM_JOBS",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub jobs: Option<u32>,

    /// Seconds a single clone may take before it is stopped, 0 for no limit.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl LoadArgs {
    /// Orchestrator limits, flags first, settings second.
    fn clone_options(&self, settings: &Settings) -> CloneOptions {
        let mut options = settings.clone_options();
        if let Some(jobs) = self.jobs {
            options.max_parallel = jobs as usize;
        }
        if let Some(secs) = self.timeout {
            options.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        options
    }
}

/// Execute the `load` command.
pub fn execute(args: LoadArgs, settings: &Settings, output: &OutputConfig) -> Result<()> {
    let options = args.clone_options(settings);
    let (root, store) = args.location.resolve(settings);
    debug!(
        "load: store={} root={} options={:?}",
        store.display(),
        root.display(),
        options
    );

    let orchestrator = CloneOrchestrator::new(options);
    let report = sync::load(&store, &root, &orchestrator);
    super::finish(&report, output)
}
