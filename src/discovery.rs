//! # Repository Discovery
//!
//! Walks a root directory and yields a [`RepositoryDescriptor`] for every
//! directory that directly contains a `.git` directory whose config names a
//! remote URL.
//!
//! ## Process
//!
//! 1.  [`discover`] checks eagerly that the root is a listable directory. A
//!     failure here is fatal to the caller.
//! 2.  The returned [`Discovery`] iterator walks the tree lazily with
//!     `walkdir`. It descends into repositories too, so nested repositories
//!     are found, but never into the `.git` directories themselves.
//! 3.  For each repository root the first line of `.git/config` containing
//!     `url = ` provides the origin. Repositories without such a line are
//!     skipped without a diagnostic; they have nothing to re-clone from.
//!
//! Problems with a single directory (unreadable listing, unreadable config)
//! are yielded as `Err` items and the walk continues with the next directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::{DirEntry, WalkDir};

use crate::descriptor::RepositoryDescriptor;
use crate::error::{Error, Result};

/// Name of the directory that marks a repository root.
pub const GIT_DIR: &str = ".git";
/// Config file inside [`GIT_DIR`] that holds the remote URL.
pub const GIT_CONFIG: &str = "config";

const URL_MARKER: &str = "url = ";

type EntryFilter = fn(&DirEntry) -> bool;

/// Lazy walk over a directory tree yielding one item per repository found.
pub struct Discovery {
    root: PathBuf,
    walker: walkdir::FilterEntry<walkdir::IntoIter, EntryFilter>,
}

/// Starts discovery below `root`.
///
/// Fails if `root` is not a directory or cannot be listed.
pub fn discover(root: impl Into<PathBuf>) -> Result<Discovery> {
    let root = root.into();
    if !fs::metadata(&root)?.is_dir() {
        return Err(Error::NotADirectory { path: root });
    }
    fs::read_dir(&root)?;

    let walker = WalkDir::new(&root)
        .into_iter()
        .filter_entry(is_not_git_dir as EntryFilter);
    Ok(Discovery { root, walker })
}

impl Discovery {
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn inspect_dir(&self, dir: &Path) -> Result<Option<RepositoryDescriptor>> {
        if !contains_git_dir(dir)? {
            return Ok(None);
        }

        let Some(origin) = read_origin_url(dir)? else {
            debug!("Skipping {}: no origin URL", dir.display());
            return Ok(None);
        };

        let local = dir
            .strip_prefix(&self.root)
            .map_err(|e| Error::DirectoryListing {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
        let descriptor = RepositoryDescriptor::from_origin(local, origin)?;
        debug!("Found repository {}", descriptor);
        Ok(Some(descriptor))
    }
}

impl Iterator for Discovery {
    type Item = Result<RepositoryDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(self.root.as_path()).to_path_buf();
                    return Some(Err(Error::DirectoryListing {
                        path,
                        message: e.to_string(),
                    }));
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            match self.inspect_dir(entry.path()) {
                Ok(Some(descriptor)) => return Some(Ok(descriptor)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn is_not_git_dir(entry: &DirEntry) -> bool {
    !(entry.file_type().is_dir() && entry.file_name() == GIT_DIR)
}

/// True if `dir` directly contains a directory named `.git`.
fn contains_git_dir(dir: &Path) -> Result<bool> {
    let listing_error = |e: std::io::Error| Error::DirectoryListing {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    for entry in fs::read_dir(dir).map_err(listing_error)? {
        let entry = entry.map_err(listing_error)?;
        if entry.file_name() == GIT_DIR && entry.path().is_dir() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Reads the first `url = ` value from the git config of `repo_root`.
pub fn read_origin_url(repo_root: &Path) -> Result<Option<String>> {
    let config_path = repo_root.join(GIT_DIR).join(GIT_CONFIG);
    let config = fs::read(&config_path).map_err(|e| Error::OriginUnreadable {
        path: repo_root.to_path_buf(),
        message: e.to_string(),
    })?;
    // Git config is bytes; other keys may hold text in a legacy encoding.
    Ok(parse_origin_url(&String::from_utf8_lossy(&config)))
}

/// Extracts the text after `url = ` on the first line containing it.
pub fn parse_origin_url(config: &str) -> Option<String> {
    config
        .lines()
        .find_map(|line| line.split_once(URL_MARKER))
        .map(|(_, url)| url.trim().to_string())
}
