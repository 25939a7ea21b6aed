use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::error::{Error, Result};

/// The command used to run git, `git` from the `PATH` unless told otherwise.
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl GitCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Adds an argument placed before the git subcommand.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.leading_args);
        command
    }
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new("git")
    }
}

/// Start `git clone` of `url` into `target_dir` without waiting for it.
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Any authentication configured in ~/.gitconfig
///
/// Interactive credential prompts are disabled so a repository that needs
/// them fails instead of blocking the whole batch.
pub fn spawn_clone(git: &GitCommand, url: &str, target_dir: &Path) -> Result<Child> {
    debug!("git clone {} {}", url, target_dir.display());
    git.command()
        .args(["clone", "--quiet", "--"])
        .arg(url)
        .arg(target_dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::CloneLaunch {
            url: url.to_string(),
            target: target_dir.to_path_buf(),
            message: e.to_string(),
        })
}

/// A running `git clone` process.
///
/// Stderr is drained by a background thread for the whole life of the
/// process; git would block once the pipe buffer is full otherwise.
#[derive(Debug)]
pub struct GitCloneProcess {
    child: Child,
    stderr: Option<JoinHandle<String>>,
    url: String,
    target_dir: PathBuf,
}

impl GitCloneProcess {
    pub fn spawn(git: &GitCommand, url: &str, target_dir: &Path) -> Result<Self> {
        let mut child = spawn_clone(git, url, target_dir)?;
        let stderr = child.stderr.take().map(drain);
        Ok(Self {
            child,
            stderr,
            url: url.to_string(),
            target_dir: target_dir.to_path_buf(),
        })
    }

    /// Polls the process without blocking.
    ///
    /// Returns `None` while git is still running. On a failed exit the
    /// captured stderr is logged.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if let Some(status) = status {
            let stderr = self.collect_stderr();
            if !status.success() {
                warn!(
                    "git clone {} into {} exited with {}: {}",
                    self.url,
                    self.target_dir.display(),
                    status,
                    stderr.trim()
                );
            }
        }
        Ok(status)
    }

    /// Kills the process and reaps it.
    ///
    /// Only git itself is signalled. Helpers it started, such as
    /// `git-remote-https`, may outlive it for a moment and keep the stderr
    /// pipe open, so the reader thread is left to finish on its own.
    pub fn kill(&mut self) -> Result<()> {
        self.child.kill()?;
        self.child.wait()?;
        self.stderr = None;
        Ok(())
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default()
    }
}

fn drain(mut pipe: ChildStderr) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        // Best effort; the exit status is what decides the outcome.
        let _ = pipe.read_to_end(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    })
}
