//! # Repository Descriptors
//!
//! A [`RepositoryDescriptor`] is the portable identity of one repository: a
//! short name, its location relative to the root directory, and the origin URL
//! it can be cloned from again.
//!
//! ## Codec
//!
//! Descriptors are stored as three `key: value` lines:
//!
//! ```text
//! name: clim
//! local: tools/clim
//! origin: git@github.com:hu-zza/clim.git
//! ```
//!
//! [`RepositoryDescriptor::encode`] always produces exactly these lines in this
//! order. [`RepositoryDescriptor::decode`] is lenient about everything except
//! the three required keys: lines without a `": "` separator are ignored and a
//! repeated key keeps its last value.
//!
//! ## Identity
//!
//! Two descriptors are equal when their local paths are equal. Name and origin
//! are payload only and take no part in `PartialEq` or `Hash`.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Key of the short repository label.
pub const NAME_KEY: &str = "name";
/// Key of the path relative to the root directory.
pub const LOCAL_KEY: &str = "local";
/// Key of the remote URL.
pub const ORIGIN_KEY: &str = "origin";

const SEPARATOR: &str = ": ";

/// Identity of one repository.
#[derive(Debug, Clone)]
pub struct RepositoryDescriptor {
    name: String,
    local_path: PathBuf,
    origin_url: String,
}

impl RepositoryDescriptor {
    /// Creates a descriptor with an explicit name.
    ///
    /// Name and origin are trimmed. The local path must be relative and must
    /// not contain `..`; `.` components are dropped.
    pub fn new(
        name: impl AsRef<str>,
        local_path: impl AsRef<Path>,
        origin_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.as_ref().trim().to_string(),
            local_path: normalize_local_path(local_path.as_ref())?,
            origin_url: origin_url.as_ref().trim().to_string(),
        })
    }

    /// Creates a descriptor named after the last segment of its origin URL.
    pub fn from_origin(local_path: impl AsRef<Path>, origin_url: impl AsRef<str>) -> Result<Self> {
        let name = name_from_origin(origin_url.as_ref());
        Self::new(name, local_path, origin_url)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn origin_url(&self) -> &str {
        &self.origin_url
    }

    /// The local path with `/` separators, as written to descriptor files.
    pub fn local_path_string(&self) -> String {
        portable_path(&self.local_path)
    }

    /// Encodes the descriptor as its three `key: value` lines.
    pub fn encode(&self) -> [String; 3] {
        [
            format!("{NAME_KEY}{SEPARATOR}{}", self.name),
            format!("{LOCAL_KEY}{SEPARATOR}{}", self.local_path_string()),
            format!("{ORIGIN_KEY}{SEPARATOR}{}", self.origin_url),
        ]
    }

    /// Decodes a descriptor from `key: value` lines.
    ///
    /// Each line is split on the first `": "`. Lines that do not split are
    /// skipped, and when a key repeats the last value wins. Fails with
    /// [`Error::MalformedDescriptor`] if `name`, `local` or `origin` is missing
    /// or if `local` is not a safe relative path.
    pub fn decode<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: HashMap<String, String> = HashMap::new();
        for line in lines {
            let line = line.as_ref();
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some((key, value)) = line.split_once(SEPARATOR) {
                entries.insert(key.to_string(), value.to_string());
            }
        }

        let name = required(&entries, NAME_KEY)?;
        let local = required(&entries, LOCAL_KEY)?;
        let origin = required(&entries, ORIGIN_KEY)?;
        Self::new(name, local, origin)
    }
}

impl PartialEq for RepositoryDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.local_path == other.local_path
    }
}

impl Eq for RepositoryDescriptor {}

impl Hash for RepositoryDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local_path.hash(state);
    }
}

impl fmt::Display for RepositoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.local_path_string(), self.origin_url)
    }
}

fn required<'a>(entries: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    entries
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::MalformedDescriptor {
            message: format!("missing key '{key}'"),
            file: None,
        })
}

/// Derives a repository name from its origin URL.
///
/// Takes the text after the last `/` (or `:` for scp-like URLs without a
/// path) and strips a trailing `.git`.
pub fn name_from_origin(origin_url: &str) -> String {
    let trimmed = origin_url.trim().trim_end_matches('/');
    let segment = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);
    segment
        .strip_suffix(".git")
        .unwrap_or(segment)
        .to_string()
}

/// Renders a relative path with `/` separators regardless of platform.
pub(crate) fn portable_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_local_path(path: &Path) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::MalformedDescriptor {
                    message: format!("local path '{}' leaves the root", path.display()),
                    file: None,
                })
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::MalformedDescriptor {
                    message: format!("local path '{}' is absolute", path.display()),
                    file: None,
                })
            }
        }
    }
    Ok(normalized)
}
