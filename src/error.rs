//! # Error Handling
//!
//! This module defines the centralized error type for the `git-form` library.
//! It uses the `thiserror` library to create an `Error` enum covering every
//! failure mode of the synchronization engine, with messages that carry the
//! offending path or URL.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Variants fall into three groups:
//!   - descriptor contract violations (`MalformedDescriptor`), which mean the
//!     input file itself is bad and retrying will not help;
//!   - store and discovery failures (`NotADirectory`, `AlreadyExists`,
//!     `DirectoryListing`, `OriginUnreadable`);
//!   - clone, settings and wrapped I/O or YAML failures.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Whether an error is fatal or only recorded in a
//! [`ResultReport`](crate::report::ResultReport) is decided by the caller, see
//! [`crate::sync`].

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for git-form operations
#[derive(Error, Debug)]
pub enum Error {
    /// A descriptor could not be decoded.
    ///
    /// Raised when a required key is missing or when the recorded local path
    /// would escape the root directory. `file` names where the lines came
    /// from when they were read from a file.
    #[error("Malformed descriptor{}: {message}", file_suffix(file))]
    MalformedDescriptor {
        message: String,
        file: Option<PathBuf>,
    },

    /// A path that must be a directory exists but is something else.
    #[error("{} should be a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// A descriptor file with the same name is already present in the store.
    #[error("Descriptor file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// The contents of a directory could not be listed during discovery.
    #[error("Cannot list directory {}: {message}", path.display())]
    DirectoryListing { path: PathBuf, message: String },

    /// The git config of a repository could not be read.
    #[error("Cannot read origin of {}: {message}", path.display())]
    OriginUnreadable { path: PathBuf, message: String },

    /// The external clone process could not be started.
    #[error("Cannot launch clone of {url} into {}: {message}", target.display())]
    CloneLaunch {
        url: String,
        target: PathBuf,
        message: String,
    },

    /// The settings file could not be read or written.
    #[error("Settings error for {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns true for errors caused by the content of a descriptor rather
    /// than by the environment.
    pub fn is_malformed_descriptor(&self) -> bool {
        matches!(self, Error::MalformedDescriptor { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

fn file_suffix(file: &Option<PathBuf>) -> String {
    file.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}
