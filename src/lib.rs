//! # git-form Library
//!
//! This library records the layout of a directory tree full of git
//! repositories and rebuilds the same layout elsewhere by cloning every
//! repository again from its origin. It is designed to be used by the
//! `git-form` command-line tool but can also be embedded into other
//! applications.
//!
//! ## Quick Example
//!
//! ```
//! use git_form::descriptor::RepositoryDescriptor;
//! use git_form::report::ResultReport;
//! use git_form::store;
//!
//! let lines = [
//!     "name: clim",
//!     "local: clim",
//!     "origin: git@github.com:hu-zza/clim.git",
//! ];
//! let descriptor = RepositoryDescriptor::decode(lines).unwrap();
//! assert_eq!(descriptor.encode(), lines.map(String::from));
//! assert_eq!(store::file_name(&descriptor), "clim_1041329644.yaml");
//!
//! let mut report = ResultReport::new("Save repositories");
//! report.append_result(descriptor.local_path_string());
//! report.set_successful(true);
//! assert!(report.render().starts_with("[done] Save repositories"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Descriptors (`descriptor`)**: The portable identity of a repository,
//!   its name, its path relative to the root and its origin URL, with a small
//!   line-based codec.
//! - **Discovery (`discovery`)**: A lazy walk that finds every directory
//!   holding a `.git` directory and reads its origin URL.
//! - **Store (`store`)**: A flat directory of descriptor files named after the
//!   repository and a hash of its local path.
//! - **Orchestrator (`orchestrator`, `git`)**: Clones missing repositories
//!   concurrently with bounded parallelism and per-clone timeouts.
//! - **Reports (`report`)**: Deterministic summaries of what an operation did.
//!
//! ## Execution Flow
//!
//! [`sync::save`] runs discovery and writes descriptors into the store.
//! [`sync::load`] reads them back and hands them to the orchestrator. Both
//! return a [`report::ResultReport`] instead of failing on the first problem.

pub mod defaults;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod git;
pub mod orchestrator;
pub mod output;
pub mod report;
pub mod settings;
pub mod store;
pub mod sync;

#[cfg(test)]
mod descriptor_proptest;
