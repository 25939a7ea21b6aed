//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_repo("tools/clim", "https://host/clim.git");
//!     fixture.command().arg("save").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::git_available;
    pub use super::TestFixture;
}

/// Returns `true` if a working `git` binary is on the `PATH`.
///
/// Tests that run real clones return early when it is not.
#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// A temporary home for one CLI invocation.
///
/// Lays out a root directory (`GIT/`), a store (`GIT/GitForm/`) and a settings
/// file path inside one temp directory, and builds commands pointing at them
/// so tests never touch the real home directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a fake repository below the root with the given origin URL.
    ///
    /// Only `.git/config` is written, which is all discovery looks at.
    pub fn with_repo(self, local: &str, origin: &str) -> Self {
        self.root()
            .child(local)
            .child(".git/config")
            .write_str(&format!(
                "[core]\n\trepositoryformatversion = 0\n[remote \"origin\"]\n\turl = {origin}\n"
            ))
            .expect("Failed to write git config");
        self
    }

    /// Add a descriptor file to the store.
    #[allow(dead_code)]
    pub fn with_descriptor(self, file_name: &str, content: &str) -> Self {
        self.store()
            .child(file_name)
            .write_str(content)
            .expect("Failed to write descriptor");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The root directory, `GIT/`.
    pub fn root(&self) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child("GIT")
    }

    /// The store directory, `GIT/GitForm/`.
    pub fn store(&self) -> assert_fs::fixture::ChildPath {
        self.root().child("GitForm")
    }

    /// The settings file used by [`command`](Self::command).
    pub fn settings_path(&self) -> PathBuf {
        self.temp_dir.path().join(".git-form/settings.yaml")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command isolated in this fixture.
    ///
    /// The settings file, root and store all point into the temp directory and
    /// colors are disabled so output can be compared as plain text.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("git-form");
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env_remove("GIT_FORM_ROOT")
            .env_remove("GIT_FORM_STORE")
            .env_remove("GIT_FORM_JOBS")
            .env_remove("RUST_LOG")
            .env("GIT_FORM_SETTINGS", self.settings_path())
            .arg("--color")
            .arg("never");
        cmd
    }

    /// Create a command with explicit `--root` and `--store` arguments.
    #[allow(dead_code)]
    pub fn command_with_dirs(&self, subcommand: &str) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg(subcommand)
            .arg("--root")
            .arg(self.root().path())
            .arg("--store")
            .arg(self.store().path());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_repo() {
        let fixture = TestFixture::new().with_repo("tools/clim", "https://host/clim.git");
        assert!(fixture.root().path().join("tools/clim/.git/config").is_file());
    }

    #[test]
    fn test_store_is_inside_root() {
        let fixture = TestFixture::new();
        assert!(fixture.store().path().starts_with(fixture.root().path()));
    }
}
