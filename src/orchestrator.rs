//! # Clone Orchestrator
//!
//! This module re-materializes repositories from their descriptors: every
//! descriptor whose target directory is missing gets cloned from its origin,
//! many clones at a time.
//!
//! ## Design
//!
//! Clone processes are started through the [`CloneLauncher`] trait and
//! observed through [`CloneHandle`]s. The default launcher runs the system
//! `git`; tests substitute a mock so that misbehaving clones can be simulated
//! without a network.
//!
//! [`CloneOrchestrator::materialize`] is driven by a single coordinating
//! thread:
//!
//! 1.  Targets that already exist are recorded and skipped; the rest are
//!     queued.
//! 2.  Up to `max_parallel` clones are launched, creating parent directories
//!     first. A repository nested inside another queued or running one waits
//!     until the outer clone is done, since `git` refuses to clone into the
//!     non-empty directory the nested parents would create.
//! 3.  The coordinator polls every running handle without blocking, records
//!     finished ones, tops the running set up from the queue, and sleeps for
//!     `poll_interval` when nothing changed.
//! 4.  A clone running longer than `timeout` is killed, its partial checkout
//!     removed, and it is recorded as timed out.
//!
//! Outcomes are only ever written by the coordinator, so no locking is
//! needed, and the sorted [`ResultReport`] hides the completion order.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::descriptor::RepositoryDescriptor;
use crate::error::Result;
use crate::git::{GitCloneProcess, GitCommand};
use crate::report::{categories, ResultReport};

/// Default number of clones allowed to run at once.
pub const DEFAULT_MAX_PARALLEL: usize = 8;
/// Default time a single clone may take.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
/// Default pause between polls when no clone finished.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Objective label of reports produced by the orchestrator.
pub const LOAD_OBJECTIVE: &str = "Load repositories";

/// A started clone whose outcome can be polled.
pub trait CloneHandle: Send {
    /// Checks for completion without blocking.
    ///
    /// `Ok(None)` while the clone runs, `Ok(Some(true))` when it exited
    /// successfully and `Ok(Some(false))` when it exited with a failure.
    fn try_wait(&mut self) -> Result<Option<bool>>;

    /// Stops the clone and waits for it to go away.
    fn kill(&mut self) -> Result<()>;
}

/// Trait for starting clones - allows mocking in tests
pub trait CloneLauncher: Send + Sync {
    /// Starts cloning `url` into `target_dir` and returns immediately.
    fn launch(&self, url: &str, target_dir: &Path) -> Result<Box<dyn CloneHandle>>;
}

/// The default implementation of `CloneLauncher`, which runs the system `git`.
#[derive(Debug, Clone, Default)]
pub struct DefaultCloneLauncher {
    git: GitCommand,
}

impl DefaultCloneLauncher {
    /// Creates a launcher that runs `git` through the given command.
    pub fn with_command(git: GitCommand) -> Self {
        Self { git }
    }
}

impl CloneLauncher for DefaultCloneLauncher {
    fn launch(&self, url: &str, target_dir: &Path) -> Result<Box<dyn CloneHandle>> {
        Ok(Box::new(GitCloneProcess::spawn(&self.git, url, target_dir)?))
    }
}

impl CloneHandle for GitCloneProcess {
    fn try_wait(&mut self) -> Result<Option<bool>> {
        Ok(GitCloneProcess::try_wait(self)?.map(|status| status.success()))
    }

    fn kill(&mut self) -> Result<()> {
        GitCloneProcess::kill(self)
    }
}

/// Limits applied to a batch of clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOptions {
    /// Maximum number of clones running at once; values below 1 count as 1.
    pub max_parallel: usize,
    /// Per-clone time limit; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Pause between polls when no clone finished.
    pub poll_interval: Duration,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            timeout: Some(DEFAULT_TIMEOUT),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A descriptor waiting for a free clone slot.
struct PendingClone {
    descriptor: RepositoryDescriptor,
    target: PathBuf,
}

/// A clone that has been launched and not yet collected.
struct RunningClone {
    descriptor: RepositoryDescriptor,
    target: PathBuf,
    handle: Box<dyn CloneHandle>,
    started: Instant,
}

enum Outcome {
    Succeeded,
    Failed,
    TimedOut,
}

/// Clones missing repositories described by descriptors.
pub struct CloneOrchestrator {
    launcher: Box<dyn CloneLauncher>,
    options: CloneOptions,
}

impl CloneOrchestrator {
    /// Creates an orchestrator that clones with the system `git`.
    pub fn new(options: CloneOptions) -> Self {
        Self::with_launcher(Box::new(DefaultCloneLauncher::default()), options)
    }

    /// Creates an orchestrator with a custom `CloneLauncher`.
    pub fn with_launcher(launcher: Box<dyn CloneLauncher>, options: CloneOptions) -> Self {
        Self { launcher, options }
    }

    pub fn options(&self) -> &CloneOptions {
        &self.options
    }

    /// Clones every descriptor whose target below `root` is missing and
    /// returns the report of the batch.
    pub fn materialize<I>(&self, descriptors: I, root: &Path) -> ResultReport
    where
        I: IntoIterator<Item = RepositoryDescriptor>,
    {
        let mut report = ResultReport::new(LOAD_OBJECTIVE);
        self.materialize_into(descriptors, root, &mut report);
        report
    }

    /// Like [`materialize`](Self::materialize), recording into an existing
    /// report.
    ///
    /// Marks the report successful once every clone has been collected,
    /// whatever the individual outcomes were.
    pub fn materialize_into<I>(&self, descriptors: I, root: &Path, report: &mut ResultReport)
    where
        I: IntoIterator<Item = RepositoryDescriptor>,
    {
        let queue = self.prepare(descriptors, root, report);
        self.run(queue, report);
        report.set_successful(true);
    }

    fn prepare<I>(
        &self,
        descriptors: I,
        root: &Path,
        report: &mut ResultReport,
    ) -> Vec<PendingClone>
    where
        I: IntoIterator<Item = RepositoryDescriptor>,
    {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut queue = Vec::new();

        for descriptor in descriptors {
            if !seen.insert(descriptor.local_path().to_path_buf()) {
                continue;
            }

            let target = root.join(descriptor.local_path());
            if target.exists() {
                report.append_additional_info(
                    categories::PROJECT_ALREADY_EXISTS,
                    descriptor.local_path_string(),
                );
                continue;
            }

            queue.push(PendingClone { descriptor, target });
        }

        queue
    }

    fn run(&self, mut queue: Vec<PendingClone>, report: &mut ResultReport) {
        let max_parallel = self.options.max_parallel.max(1);
        let mut running: Vec<RunningClone> = Vec::new();

        while !queue.is_empty() || !running.is_empty() {
            while running.len() < max_parallel {
                let Some(index) = next_ready(&queue, &running) else {
                    break;
                };
                let pending = queue.remove(index);
                if let Some(clone) = self.launch(pending, report) {
                    running.push(clone);
                }
            }

            let mut collected = false;
            let mut index = 0;
            while index < running.len() {
                match self.poll(&mut running[index]) {
                    Some(outcome) => {
                        let finished = running.swap_remove(index);
                        record(report, &finished.descriptor, outcome);
                        collected = true;
                    }
                    None => index += 1,
                }
            }

            if !collected && !running.is_empty() {
                thread::sleep(self.options.poll_interval);
            }
        }
    }

    fn launch(&self, pending: PendingClone, report: &mut ResultReport) -> Option<RunningClone> {
        let PendingClone { descriptor, target } = pending;

        // An outer clone finished since queueing may have brought this one along.
        if target.exists() {
            report.append_additional_info(
                categories::PROJECT_ALREADY_EXISTS,
                descriptor.local_path_string(),
            );
            return None;
        }

        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Cannot create {}: {}", parent.display(), e);
                report.append_additional_info(
                    categories::CANNOT_CLONE_PROJECT,
                    descriptor.to_string(),
                );
                return None;
            }
        }

        match self.launcher.launch(descriptor.origin_url(), &target) {
            Ok(handle) => {
                info!("Cloning {} into {}", descriptor.origin_url(), target.display());
                Some(RunningClone {
                    descriptor,
                    target,
                    handle,
                    started: Instant::now(),
                })
            }
            Err(e) => {
                warn!("{}", e);
                report.append_additional_info(
                    categories::CANNOT_CLONE_PROJECT,
                    descriptor.to_string(),
                );
                None
            }
        }
    }

    /// Returns the outcome of a finished clone, or `None` while it runs.
    fn poll(&self, clone: &mut RunningClone) -> Option<Outcome> {
        match clone.handle.try_wait() {
            Ok(Some(true)) => Some(Outcome::Succeeded),
            Ok(Some(false)) => {
                warn!("Clone of {} failed", clone.descriptor);
                Some(Outcome::Failed)
            }
            Err(e) => {
                warn!("Cannot retrieve outcome of {}: {}", clone.descriptor, e);
                Some(Outcome::Failed)
            }
            Ok(None) => {
                let expired = self
                    .options
                    .timeout
                    .is_some_and(|timeout| clone.started.elapsed() >= timeout);
                if !expired {
                    return None;
                }
                warn!("Clone of {} timed out", clone.descriptor);
                if let Err(e) = clone.handle.kill() {
                    warn!("Cannot stop clone of {}: {}", clone.descriptor, e);
                }
                remove_partial_checkout(&clone.target);
                Some(Outcome::TimedOut)
            }
        }
    }
}

impl Default for CloneOrchestrator {
    fn default() -> Self {
        Self::new(CloneOptions::default())
    }
}

/// Index of the first queued clone that is not nested inside another queued
/// or running clone.
fn next_ready(queue: &[PendingClone], running: &[RunningClone]) -> Option<usize> {
    (0..queue.len()).find(|&index| {
        let local = queue[index].descriptor.local_path();
        let inside_running = running
            .iter()
            .any(|clone| local.starts_with(clone.descriptor.local_path()));
        let inside_queued = queue.iter().enumerate().any(|(other, pending)| {
            other != index && local.starts_with(pending.descriptor.local_path())
        });
        !inside_running && !inside_queued
    })
}

fn record(report: &mut ResultReport, descriptor: &RepositoryDescriptor, outcome: Outcome) {
    let local = descriptor.local_path_string();
    match outcome {
        Outcome::Succeeded => report.append_result(local),
        Outcome::Failed => report.append_additional_info(categories::CANNOT_LOAD_PROJECT, local),
        Outcome::TimedOut => {
            report.append_additional_info(categories::CANNOT_CLONE_PROJECT_TIMEOUT, local)
        }
    }
}

/// Pause before the second removal attempt of a partial checkout.
const REMOVAL_RETRY_DELAY: Duration = Duration::from_millis(100);

/// The target did not exist before the clone started, so anything there now
/// was left behind by the killed clone.
///
/// Killing git does not stop helpers it spawned, which can still create
/// files while the tree is being removed. One retry after a short pause
/// covers them; whatever survives that is logged and left in place.
fn remove_partial_checkout(target: &Path) {
    if !target.exists() {
        return;
    }
    if let Err(first) = fs::remove_dir_all(target) {
        debug!("Retrying removal of {}: {}", target.display(), first);
        thread::sleep(REMOVAL_RETRY_DELAY);
        if let Err(e) = fs::remove_dir_all(target) {
            if target.exists() {
                warn!("Cannot remove partial clone {}: {}", target.display(), e);
            }
        }
    }
}
