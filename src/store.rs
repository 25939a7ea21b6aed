//! # Descriptor Store
//!
//! The store is a flat directory of descriptor files, one per repository,
//! named `{name}_{hash}.yaml` where `hash` is a stable hash of the local path.
//! The name keeps the directory readable for humans; the hash keeps two
//! repositories with the same name apart.
//!
//! Files are never overwritten. Writing a descriptor whose file already exists
//! fails with [`Error::AlreadyExists`], which is how a repeated `save` over an
//! unchanged tree reports every repository as already recorded.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::descriptor::RepositoryDescriptor;
use crate::error::{Error, Result};

/// Extension of descriptor files, without the dot.
pub const DESCRIPTOR_EXTENSION: &str = "yaml";

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// A directory of descriptor files.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    dir: PathBuf,
}

impl DescriptorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the store directory if it does not exist yet.
    pub fn ensure_output_directory(&self) -> Result<()> {
        ensure_output_directory(&self.dir)
    }

    /// Path of the file that holds `descriptor` in this store.
    pub fn file_path(&self, descriptor: &RepositoryDescriptor) -> PathBuf {
        self.dir.join(file_name(descriptor))
    }

    /// Writes `descriptor` to a new file and returns its path.
    ///
    /// A file that cannot be written completely is removed again, so a later
    /// run does not find a truncated descriptor reported as already existing.
    pub fn write(&self, descriptor: &RepositoryDescriptor) -> Result<PathBuf> {
        let path = self.file_path(descriptor);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => Error::AlreadyExists { path: path.clone() },
                _ => Error::Io(e),
            })?;

        let mut content = descriptor.encode().join("\n");
        content.push('\n');
        write_or_remove(&path, file, content.as_bytes())?;

        debug!("Wrote {} to {}", descriptor.local_path_string(), path.display());
        Ok(path)
    }

    /// Lists the descriptor files directly inside the store, sorted by path.
    pub fn list_descriptor_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && is_descriptor_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Reads and decodes one descriptor file.
    pub fn load(&self, path: &Path) -> Result<RepositoryDescriptor> {
        load(path)
    }
}

/// Creates `path` and its parents if absent.
///
/// Fails with [`Error::NotADirectory`] if `path` exists but is not a
/// directory.
pub fn ensure_output_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::NotADirectory {
                path: path.to_path_buf(),
            });
        }
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Reads and decodes the descriptor file at `path`.
pub fn load(path: &Path) -> Result<RepositoryDescriptor> {
    let content = fs::read_to_string(path)?;
    RepositoryDescriptor::decode(content.lines()).map_err(|e| match e {
        Error::MalformedDescriptor { message, .. } => Error::MalformedDescriptor {
            message,
            file: Some(path.to_path_buf()),
        },
        other => other,
    })
}

/// File name of a descriptor: `{name}_{hash(local path)}.yaml`.
pub fn file_name(descriptor: &RepositoryDescriptor) -> String {
    format!(
        "{}_{}.{}",
        descriptor.name(),
        local_path_hash(descriptor),
        DESCRIPTOR_EXTENSION
    )
}

/// 32-bit FNV-1a of the `/`-separated local path.
///
/// Depends on the local path only, so the same tree always produces the same
/// file names on every machine.
pub fn local_path_hash(descriptor: &RepositoryDescriptor) -> u32 {
    descriptor
        .local_path_string()
        .bytes()
        .fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
        })
}

/// Writes `content` through `writer`, deleting `path` if that fails.
fn write_or_remove(path: &Path, mut writer: impl Write, content: &[u8]) -> Result<()> {
    let written = writer.write_all(content).and_then(|()| writer.flush());
    drop(writer);
    if let Err(e) = written {
        if let Err(remove) = fs::remove_file(path) {
            debug!("Cannot remove {}: {}", path.display(), remove);
        }
        return Err(e.into());
    }
    Ok(())
}

fn is_descriptor_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            name.to_string_lossy()
                .ends_with(&format!(".{DESCRIPTOR_EXTENSION}"))
        })
        .unwrap_or(false)
}
