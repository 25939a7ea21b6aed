//! # Save and Load
//!
//! The two top-level operations of git-form.
//!
//! - [`save`] walks a root directory, writes one descriptor file per
//!   repository found into the store, and reports what was recorded.
//! - [`load`] reads every descriptor file in the store and clones the
//!   repositories that are missing below the root.
//!
//! Both always return a [`ResultReport`]. Problems with single items are
//! recorded in the report and processing goes on; only a store or root that
//! cannot be used at all ends the operation early, in which case the report is
//! left unsuccessful with one line under
//! [`CANNOT_SAVE_PROJECTS`](categories::CANNOT_SAVE_PROJECTS) or
//! [`CANNOT_LOAD_PROJECTS`](categories::CANNOT_LOAD_PROJECTS).

use std::path::Path;

use log::{info, warn};

use crate::descriptor::RepositoryDescriptor;
use crate::discovery;
use crate::error::Error;
use crate::orchestrator::{CloneOrchestrator, LOAD_OBJECTIVE};
use crate::report::{categories, ResultReport};
use crate::store::DescriptorStore;

/// Objective label of reports produced by [`save`].
pub const SAVE_OBJECTIVE: &str = "Save repositories";

/// Records every repository below `root` as a descriptor file in `store_dir`.
pub fn save(root: &Path, store_dir: &Path) -> ResultReport {
    let mut report = ResultReport::new(SAVE_OBJECTIVE);
    let store = DescriptorStore::new(store_dir);

    if let Err(e) = store.ensure_output_directory() {
        warn!("Cannot prepare store {}: {}", store_dir.display(), e);
        report.append_additional_info(categories::CANNOT_SAVE_PROJECTS, e.to_string());
        return report;
    }

    let discovery = match discovery::discover(root) {
        Ok(discovery) => discovery,
        Err(e) => {
            warn!("Cannot walk {}: {}", root.display(), e);
            report.append_additional_info(
                categories::CANNOT_SAVE_PROJECTS,
                format!("{}: {}", root.display(), e),
            );
            return report;
        }
    };

    info!("Saving repositories below {} into {}", root.display(), store_dir.display());
    for item in discovery {
        match item {
            Ok(descriptor) => save_descriptor(&store, &descriptor, &mut report),
            Err(e) => record_discovery_error(e, &mut report),
        }
    }

    report.set_successful(true);
    report
}

fn save_descriptor(
    store: &DescriptorStore,
    descriptor: &RepositoryDescriptor,
    report: &mut ResultReport,
) {
    match store.write(descriptor) {
        Ok(_) => report.append_result(descriptor.local_path_string()),
        Err(Error::AlreadyExists { .. }) => {
            report.append_additional_info(
                categories::PROJECT_ALREADY_EXISTS,
                descriptor.local_path_string(),
            );
        }
        Err(e) => {
            warn!("Cannot save {}: {}", descriptor, e);
            report.append_additional_info(
                categories::CANNOT_SAVE_PROJECT,
                descriptor.local_path_string(),
            );
        }
    }
}

fn record_discovery_error(error: Error, report: &mut ResultReport) {
    warn!("{}", error);
    match error {
        Error::DirectoryListing { path, .. } => {
            report.append_additional_info(
                categories::CANNOT_DETERMINE_PROJECT,
                path.display().to_string(),
            );
        }
        Error::OriginUnreadable { path, .. } => {
            report.append_additional_info(
                categories::CANNOT_RETRIEVE_ORIGIN,
                path.display().to_string(),
            );
        }
        other => {
            report.append_additional_info(categories::CANNOT_SAVE_PROJECT, other.to_string());
        }
    }
}

/// Clones every repository recorded in `store_dir` that is missing below
/// `root`.
pub fn load(store_dir: &Path, root: &Path, orchestrator: &CloneOrchestrator) -> ResultReport {
    let mut report = ResultReport::new(LOAD_OBJECTIVE);
    let store = DescriptorStore::new(store_dir);

    let files = match store.list_descriptor_files() {
        Ok(files) => files,
        Err(e) => {
            warn!("Cannot list store {}: {}", store_dir.display(), e);
            report.append_additional_info(
                categories::CANNOT_LOAD_PROJECTS,
                format!("{}: {}", store_dir.display(), e),
            );
            return report;
        }
    };

    let mut descriptors = Vec::with_capacity(files.len());
    for file in &files {
        match store.load(file) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => {
                warn!("{}", e);
                report.append_additional_info(
                    categories::CANNOT_PARSE_PROJECT_FILE,
                    file.display().to_string(),
                );
            }
        }
    }

    info!(
        "Loading {} repositories from {} into {}",
        descriptors.len(),
        store_dir.display(),
        root.display()
    );
    orchestrator.materialize_into(descriptors, root, &mut report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{CloneHandle, CloneLauncher, CloneOptions};
    use crate::store;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Clones instantly by creating the target's `.git` directory.
    struct InstantLauncher {
        launched: Arc<Mutex<Vec<PathBuf>>>,
    }

    struct Done;

    impl CloneHandle for Done {
        fn try_wait(&mut self) -> crate::error::Result<Option<bool>> {
            Ok(Some(true))
        }

        fn kill(&mut self) -> crate::error::Result<()> {
            Ok(())
        }
    }

    impl CloneLauncher for InstantLauncher {
        fn launch(
            &self,
            _url: &str,
            target_dir: &Path,
        ) -> crate::error::Result<Box<dyn CloneHandle>> {
            fs::create_dir_all(target_dir.join(".git"))?;
            self.launched.lock().unwrap().push(target_dir.to_path_buf());
            Ok(Box::new(Done))
        }
    }

    fn instant_orchestrator() -> (CloneOrchestrator, Arc<Mutex<Vec<PathBuf>>>) {
        let launched = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = CloneOrchestrator::with_launcher(
            Box::new(InstantLauncher {
                launched: launched.clone(),
            }),
            CloneOptions {
                poll_interval: Duration::from_millis(1),
                ..CloneOptions::default()
            },
        );
        (orchestrator, launched)
    }

    fn make_repo(root: &Path, relative: &str, url: &str) {
        let git_dir = root.join(relative).join(".git");
        fs::create_dir_all(&git_dir).unwrap();
        fs::write(
            git_dir.join("config"),
            format!("[remote \"origin\"]\n\turl = {url}\n"),
        )
        .unwrap();
    }

    #[test]
    fn test_save_writes_descriptors() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("GIT");
        let store_dir = root.join("GitForm");
        make_repo(&root, "clim", "git@github.com:hu-zza/clim.git");
        make_repo(&root, "work/api", "https://host/api.git");

        let report = save(&root, &store_dir);

        assert!(report.is_successful());
        assert_eq!(
            report.results().iter().collect::<Vec<_>>(),
            vec!["clim", "work/api"]
        );
        assert!(report.additional_info().is_empty());
        assert_eq!(
            fs::read_to_string(store_dir.join("clim_1041329644.yaml")).unwrap(),
            "name: clim\nlocal: clim\norigin: git@github.com:hu-zza/clim.git\n"
        );
        assert_eq!(DescriptorStore::new(&store_dir).list_descriptor_files().unwrap().len(), 2);
    }

    #[test]
    fn test_second_save_reports_already_existing() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("GIT");
        let store_dir = root.join("GitForm");
        make_repo(&root, "clim", "git@github.com:hu-zza/clim.git");

        assert!(save(&root, &store_dir).is_successful());
        let report = save(&root, &store_dir);

        assert!(report.is_successful());
        assert!(report.results().is_empty());
        assert_eq!(
            report
                .info(categories::PROJECT_ALREADY_EXISTS)
                .unwrap()
                .iter()
                .collect::<Vec<_>>(),
            vec!["clim"]
        );
    }

    #[test]
    fn test_save_records_unreadable_origin() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("GIT");
        fs::create_dir_all(root.join("broken/.git")).unwrap();
        make_repo(&root, "fine", "https://host/fine.git");

        let report = save(&root, &root.join("GitForm"));

        assert!(report.is_successful());
        assert_eq!(report.results().iter().collect::<Vec<_>>(), vec!["fine"]);
        let origin = report.info(categories::CANNOT_RETRIEVE_ORIGIN).unwrap();
        assert_eq!(
            origin.iter().collect::<Vec<_>>(),
            vec![&root.join("broken").display().to_string()]
        );
    }

    #[test]
    fn test_save_with_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let report = save(&temp.path().join("missing"), &temp.path().join("store"));

        assert!(!report.is_successful());
        assert!(report.results().is_empty());
        assert_eq!(report.info(categories::CANNOT_SAVE_PROJECTS).map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_failed_write_records_local_path() {
        let temp = TempDir::new().unwrap();
        let store = DescriptorStore::new(temp.path().join("removed-store"));
        let descriptor =
            RepositoryDescriptor::from_origin("tools/clim", "https://host/clim.git").unwrap();
        let mut report = ResultReport::new(SAVE_OBJECTIVE);

        save_descriptor(&store, &descriptor, &mut report);

        assert!(report.results().is_empty());
        let failed = report.info(categories::CANNOT_SAVE_PROJECT).unwrap();
        assert_eq!(failed.iter().collect::<Vec<_>>(), vec!["tools/clim"]);
    }

    #[test]
    fn test_save_with_file_as_store_is_fatal() {
        let temp = TempDir::new().unwrap();
        let store_file = temp.path().join("GitForm");
        fs::write(&store_file, "x").unwrap();
        make_repo(temp.path(), "clim", "https://host/clim.git");

        let report = save(temp.path(), &store_file);

        assert!(!report.is_successful());
        assert!(report.render().starts_with("[fail] Save repositories"));
        assert!(report.info(categories::CANNOT_SAVE_PROJECTS).is_some());
    }

    #[test]
    fn test_load_clones_missing_repositories() {
        let temp = TempDir::new().unwrap();
        let store_dir = temp.path().join("store");
        let root = temp.path().join("GIT");
        let store = DescriptorStore::new(&store_dir);
        store.ensure_output_directory().unwrap();
        let clim =
            RepositoryDescriptor::from_origin("clim", "git@github.com:hu-zza/clim.git").unwrap();
        store.write(&clim).unwrap();
        store
            .write(&RepositoryDescriptor::from_origin("work/api", "https://host/api.git").unwrap())
            .unwrap();
        fs::create_dir_all(root.join("work/api")).unwrap();

        let (orchestrator, launched) = instant_orchestrator();
        let report = load(&store_dir, &root, &orchestrator);

        assert!(report.is_successful());
        assert_eq!(report.objective(), LOAD_OBJECTIVE);
        assert_eq!(report.results().iter().collect::<Vec<_>>(), vec!["clim"]);
        assert_eq!(
            report
                .info(categories::PROJECT_ALREADY_EXISTS)
                .unwrap()
                .iter()
                .collect::<Vec<_>>(),
            vec!["work/api"]
        );
        assert_eq!(*launched.lock().unwrap(), vec![root.join("clim")]);
    }

    #[test]
    fn test_load_records_malformed_files() {
        let temp = TempDir::new().unwrap();
        let store_dir = temp.path().join("store");
        fs::create_dir_all(&store_dir).unwrap();
        let broken = store_dir.join("broken_1.yaml");
        fs::write(&broken, "name: broken\nlocal: broken\n").unwrap();
        let escaping = store_dir.join("escape_2.yaml");
        fs::write(&escaping, "name: x\nlocal: ../outside\norigin: u\n").unwrap();

        let (orchestrator, launched) = instant_orchestrator();
        let report = load(&store_dir, &temp.path().join("GIT"), &orchestrator);

        assert!(report.is_successful());
        assert!(report.results().is_empty());
        let parse = report.info(categories::CANNOT_PARSE_PROJECT_FILE).unwrap();
        assert!(parse.contains(&broken.display().to_string()));
        assert!(parse.contains(&escaping.display().to_string()));
        assert!(launched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_load_with_missing_store_is_fatal() {
        let temp = TempDir::new().unwrap();
        let (orchestrator, _) = instant_orchestrator();

        let report = load(&temp.path().join("missing"), temp.path(), &orchestrator);

        assert!(!report.is_successful());
        assert_eq!(report.info(categories::CANNOT_LOAD_PROJECTS).map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_load_empty_store() {
        let temp = TempDir::new().unwrap();
        let (orchestrator, _) = instant_orchestrator();

        let report = load(temp.path(), temp.path(), &orchestrator);

        assert!(report.is_successful());
        assert!(report.render().contains("No result"));
    }

    #[test]
    fn test_save_then_load_rebuilds_layout() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let store_dir = temp.path().join("store");
        make_repo(&source, "tools/clim", "git@github.com:hu-zza/clim.git");
        make_repo(&source, "tools/clim/plugins/extra", "https://host/extra.git");
        make_repo(&source, "site", "https://host/site.git");

        let saved = save(&source, &store_dir);
        assert_eq!(saved.results().len(), 3);

        let target = temp.path().join("target");
        let (orchestrator, _) = instant_orchestrator();
        let loaded = load(&store_dir, &target, &orchestrator);

        assert_eq!(loaded.results(), saved.results());
        for local in saved.results() {
            assert!(target.join(local).join(".git").is_dir());
        }
        let file = store_dir.join(store::file_name(
            &RepositoryDescriptor::from_origin("site", "https://host/site.git").unwrap(),
        ));
        assert!(file.is_file());
    }
}
