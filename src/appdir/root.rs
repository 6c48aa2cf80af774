//! Deployment of files into the AppDir root directory.

use std::path::{Path, PathBuf};

use super::{BundleManager, DesktopEntry, DesktopFile};
use crate::error::AppDirError;

/// Resolve the main desktop file from all deployed ones.
///
/// With no requested desktop files, the first deployed one is used with a
/// warning. Otherwise the first requested path's file name must match a
/// deployed desktop file.
///
/// # Errors
///
/// [`AppDirError::DesktopFileMissing`] when the requested desktop file is
/// not among the deployed ones (any more).
pub fn main_desktop_file(
    requested: &[PathBuf],
    deployed: &[DesktopFile],
) -> Result<DesktopFile, AppDirError> {
    let Some(first_requested) = requested.first() else {
        let Some(first_deployed) = deployed.first() else {
            return Err(AppDirError::DesktopFileMissing {
                name: "<none deployed>".to_string(),
            });
        };

        log::warn!(
            "No desktop file specified, using first desktop file found: {}",
            first_deployed.path().display()
        );
        return Ok(first_deployed.clone());
    };

    let requested_name = first_requested.file_name().map(|name| name.to_os_string());

    match deployed
        .iter()
        .find(|desktop_file| desktop_file.path().file_name().map(|n| n.to_os_string()) == requested_name)
    {
        Some(desktop_file) => Ok(desktop_file.clone()),
        None => {
            let name = first_requested.display().to_string();
            log::error!("Could not find desktop file deployed earlier any more: {name}");
            Err(AppDirError::DesktopFileMissing { name })
        }
    }
}

/// Deploy AppRun, desktop file and icon references into the AppDir root.
///
/// A custom AppRun, if given, replaces any existing one (with a warning)
/// before root setup. Returns `Ok(true)` on success and when there is
/// nothing to do, `Ok(false)` when root setup could not complete because
/// the requested desktop file is gone; only filesystem failures are
/// errors.
pub fn deploy_root_files<B: BundleManager>(
    requested_desktop_files: &[PathBuf],
    custom_app_run: Option<&Path>,
    appdir: &mut B,
) -> Result<bool, AppDirError> {
    log::info!("-- Deploying files into AppDir root directory --");

    if let Some(app_run) = custom_app_run {
        log::info!("Deploying custom AppRun: {}", app_run.display());

        let app_run_in_appdir = appdir.path().join("AppRun");
        if app_run_in_appdir.exists() {
            log::warn!("File exists, replacing with custom AppRun");
            std::fs::remove_file(&app_run_in_appdir).map_err(|source| AppDirError::Io {
                context: "removing existing AppRun",
                path: app_run_in_appdir.clone(),
                source,
            })?;
        }

        appdir.deploy_file(app_run, &app_run_in_appdir);
        appdir.execute_deferred_operations()?;
    }

    let deployed = appdir.deployed_desktop_files();
    if deployed.is_empty() {
        log::warn!(
            "Could not find desktop file in AppDir, cannot create links for AppRun, \
             desktop file and icon in AppDir root"
        );
        return Ok(true);
    }

    match main_desktop_file(requested_desktop_files, &deployed) {
        Ok(desktop_file) => {
            log::info!(
                "Deploying files to AppDir root using desktop file: {}",
                desktop_file.path().display()
            );
            Ok(appdir.set_up_app_dir_root(&desktop_file, custom_app_run))
        }
        Err(AppDirError::DesktopFileMissing { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Fill missing default keys into a desktop file's main section.
///
/// Name, Exec and Icon default to the executable file name, Type to
/// `Application` and Categories to `Utility;`. Existing keys are never
/// modified; each one produces a warning and makes the result `false`.
pub fn add_default_keys(desktop_file: &mut DesktopFile, executable_file_name: &str) -> bool {
    log::info!(
        "Adding default values to desktop file: {}",
        desktop_file.path().display()
    );

    let mut all_keys_set = true;

    let defaults = [
        ("Name", executable_file_name),
        ("Exec", executable_file_name),
        ("Icon", executable_file_name),
        ("Type", "Application"),
        ("Categories", "Utility;"),
    ];

    for (key, value) in defaults {
        if desktop_file.entry_exists("Desktop Entry", key) {
            let current_value = desktop_file
                .get_entry("Desktop Entry", key)
                .map(DesktopEntry::value)
                .unwrap_or_default();
            log::warn!("Key exists, not modified: {key} (current value: {current_value})");
            all_keys_set = false;
        } else {
            let overwritten =
                desktop_file.set_entry("Desktop Entry", DesktopEntry::new(key, value));
            debug_assert!(!overwritten);
        }
    }

    all_keys_set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct MockBundle {
        path: PathBuf,
        desktop_files: Vec<DesktopFile>,
        deployed: Vec<(PathBuf, PathBuf)>,
        executed_batches: usize,
        root_set_up_with: Option<PathBuf>,
    }

    impl BundleManager for MockBundle {
        fn path(&self) -> &Path {
            &self.path
        }

        fn deploy_file(&mut self, src: &Path, dst: &Path) {
            self.deployed.push((src.to_path_buf(), dst.to_path_buf()));
        }

        fn deployed_desktop_files(&self) -> Vec<DesktopFile> {
            self.desktop_files.clone()
        }

        fn set_up_app_dir_root(
            &mut self,
            desktop_file: &DesktopFile,
            _custom_app_run: Option<&Path>,
        ) -> bool {
            self.root_set_up_with = Some(desktop_file.path().to_path_buf());
            true
        }

        fn execute_deferred_operations(&mut self) -> Result<(), AppDirError> {
            self.executed_batches += 1;
            Ok(())
        }
    }

    fn deployed_files(names: &[&str]) -> Vec<DesktopFile> {
        names
            .iter()
            .map(|name| DesktopFile::new(format!("/appdir/usr/share/applications/{name}")))
            .collect()
    }

    #[test]
    fn first_deployed_file_is_used_when_none_requested() {
        let deployed = deployed_files(&["one.desktop", "two.desktop"]);

        let main = main_desktop_file(&[], &deployed).expect("resolution failed");
        assert_eq!(main.path(), deployed[0].path());
    }

    #[test]
    fn requested_file_is_matched_by_file_name() {
        let deployed = deployed_files(&["one.desktop", "two.desktop"]);
        let requested = vec![PathBuf::from("/somewhere/else/two.desktop")];

        let main = main_desktop_file(&requested, &deployed).expect("resolution failed");
        assert_eq!(main.path(), deployed[1].path());
    }

    #[test]
    fn missing_requested_file_is_an_error() {
        let deployed = deployed_files(&["one.desktop"]);
        let requested = vec![PathBuf::from("gone.desktop")];

        let result = main_desktop_file(&requested, &deployed);
        assert!(matches!(
            result,
            Err(AppDirError::DesktopFileMissing { .. })
        ));
    }

    #[test]
    fn root_deployment_without_desktop_files_succeeds() {
        let mut bundle = MockBundle::default();

        let result = deploy_root_files(&[], None, &mut bundle).expect("deployment failed");
        assert!(result);
        assert!(bundle.root_set_up_with.is_none());
    }

    #[test]
    fn root_deployment_uses_the_main_desktop_file() {
        let mut bundle = MockBundle {
            desktop_files: deployed_files(&["app.desktop"]),
            ..MockBundle::default()
        };

        let result = deploy_root_files(&[], None, &mut bundle).expect("deployment failed");
        assert!(result);
        assert_eq!(
            bundle.root_set_up_with.as_deref(),
            Some(Path::new("/appdir/usr/share/applications/app.desktop"))
        );
    }

    #[test]
    fn stale_requested_desktop_file_is_recoverable() {
        let mut bundle = MockBundle {
            desktop_files: deployed_files(&["app.desktop"]),
            ..MockBundle::default()
        };
        let requested = vec![PathBuf::from("gone.desktop")];

        let result = deploy_root_files(&requested, None, &mut bundle).expect("deployment failed");
        assert!(!result);
        assert!(bundle.root_set_up_with.is_none());
    }

    #[test]
    fn custom_app_run_is_deployed_immediately() {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let app_run = tmp.path().join("my-apprun");
        std::fs::write(&app_run, "#!/bin/sh\n").expect("failed to write AppRun");

        let mut bundle = MockBundle {
            path: tmp.path().to_path_buf(),
            ..MockBundle::default()
        };

        let result =
            deploy_root_files(&[], Some(&app_run), &mut bundle).expect("deployment failed");
        assert!(result);
        assert_eq!(bundle.deployed.len(), 1);
        assert_eq!(bundle.deployed[0].1, tmp.path().join("AppRun"));
        assert_eq!(bundle.executed_batches, 1);
    }

    #[test]
    fn defaults_fill_an_empty_desktop_file() {
        let mut desktop_file = DesktopFile::new("/tmp/app.desktop");

        assert!(add_default_keys(&mut desktop_file, "myapp"));

        for key in ["Name", "Exec", "Icon"] {
            assert_eq!(
                desktop_file
                    .get_entry("Desktop Entry", key)
                    .map(DesktopEntry::value),
                Some("myapp")
            );
        }
        assert_eq!(
            desktop_file
                .get_entry("Desktop Entry", "Type")
                .map(DesktopEntry::value),
            Some("Application")
        );
        assert_eq!(
            desktop_file
                .get_entry("Desktop Entry", "Categories")
                .map(DesktopEntry::value),
            Some("Utility;")
        );
    }

    #[test]
    fn existing_keys_are_not_modified() {
        let mut desktop_file = DesktopFile::new("/tmp/app.desktop");
        desktop_file.set_entry("Desktop Entry", DesktopEntry::new("Name", "Custom Name"));

        assert!(!add_default_keys(&mut desktop_file, "myapp"));
        assert_eq!(
            desktop_file
                .get_entry("Desktop Entry", "Name")
                .map(DesktopEntry::value),
            Some("Custom Name")
        );
        // the other keys are still filled in
        assert!(desktop_file.entry_exists("Desktop Entry", "Exec"));
    }
}
