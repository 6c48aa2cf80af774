//! AppDir bundle management.
//!
//! An AppDir is a self-contained directory tree holding an application and
//! its runtime dependencies. This module provides the [`BundleManager`]
//! contract the deployment logic operates against, an in-memory
//! desktop-entry model, and a minimal concrete [`AppDir`] implementation
//! backing the CLI.
//!
//! Desktop files are modeled in memory only; reading and writing the
//! `.desktop` text format is out of scope here.

mod root;

pub use root::{add_default_keys, deploy_root_files, main_desktop_file};

use std::path::{Path, PathBuf};

use crate::error::AppDirError;

/// One key/value pair of a desktop-entry section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    key: String,
    value: String,
}

impl DesktopEntry {
    /// Create an entry from key and value
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Entry key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Entry value
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// In-memory model of a desktop file: a path plus ordered sections of
/// ordered entries
#[derive(Debug, Clone, Default)]
pub struct DesktopFile {
    path: PathBuf,
    sections: Vec<(String, Vec<DesktopEntry>)>,
}

impl DesktopFile {
    /// Create an empty model for the desktop file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sections: Vec::new(),
        }
    }

    /// Path of the modeled desktop file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `key` exists in `section`
    pub fn entry_exists(&self, section: &str, key: &str) -> bool {
        self.get_entry(section, key).is_some()
    }

    /// Look up the entry for `key` in `section`
    pub fn get_entry(&self, section: &str, key: &str) -> Option<&DesktopEntry> {
        self.sections
            .iter()
            .find(|(name, _)| name == section)
            .and_then(|(_, entries)| entries.iter().find(|entry| entry.key() == key))
    }

    /// Insert `entry` into `section`, creating the section if needed.
    ///
    /// Returns `true` if an existing entry with the same key was
    /// overwritten.
    pub fn set_entry(&mut self, section: &str, entry: DesktopEntry) -> bool {
        let index = match self.sections.iter().position(|(name, _)| name == section) {
            Some(index) => index,
            None => {
                self.sections.push((section.to_string(), Vec::new()));
                self.sections.len() - 1
            }
        };
        let entries = &mut self.sections[index].1;

        match entries.iter_mut().find(|existing| existing.key() == entry.key()) {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => {
                entries.push(entry);
                false
            }
        }
    }
}

/// Contract between the deployment logic and a bundle directory.
///
/// File deployments are recorded as deferred operations and executed in one
/// batch, so a manager can reorder or coalesce them.
pub trait BundleManager {
    /// Root directory of the bundle
    fn path(&self) -> &Path;

    /// Record a deferred copy of `src` to `dst`
    fn deploy_file(&mut self, src: &Path, dst: &Path);

    /// Desktop files deployed into the bundle so far
    fn deployed_desktop_files(&self) -> Vec<DesktopFile>;

    /// Populate the bundle root from `desktop_file`, optionally with a
    /// custom entry point. Returns whether the root could be set up.
    fn set_up_app_dir_root(
        &mut self,
        desktop_file: &DesktopFile,
        custom_app_run: Option<&Path>,
    ) -> bool;

    /// Execute all recorded deferred operations
    fn execute_deferred_operations(&mut self) -> Result<(), AppDirError>;
}

/// Minimal concrete bundle manager over a real AppDir tree.
///
/// Creates the conventional skeleton (`usr/bin`, `usr/lib`,
/// `usr/share/applications`, `usr/share/icons/hicolor`) and executes
/// deferred copies with plain file copies. Desktop files deployed through
/// other collaborators are registered explicitly.
#[derive(Debug)]
pub struct AppDir {
    path: PathBuf,
    deferred: Vec<(PathBuf, PathBuf)>,
    desktop_files: Vec<DesktopFile>,
}

impl AppDir {
    /// Create the AppDir skeleton below `path`
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, AppDirError> {
        let path = path.into();

        for subdir in [
            "usr/bin",
            "usr/lib",
            "usr/share/applications",
            "usr/share/icons/hicolor",
        ] {
            let dir = path.join(subdir);
            std::fs::create_dir_all(&dir).map_err(|source| AppDirError::Io {
                context: "creating AppDir structure",
                path: dir.clone(),
                source,
            })?;
        }

        Ok(Self {
            path,
            deferred: Vec::new(),
            desktop_files: Vec::new(),
        })
    }

    /// Register a desktop file as deployed into this AppDir
    pub fn register_desktop_file(&mut self, desktop_file: DesktopFile) {
        self.desktop_files.push(desktop_file);
    }
}

impl BundleManager for AppDir {
    fn path(&self) -> &Path {
        &self.path
    }

    fn deploy_file(&mut self, src: &Path, dst: &Path) {
        log::debug!("deferring copy of {} to {}", src.display(), dst.display());
        self.deferred.push((src.to_path_buf(), dst.to_path_buf()));
    }

    fn deployed_desktop_files(&self) -> Vec<DesktopFile> {
        self.desktop_files.clone()
    }

    fn set_up_app_dir_root(
        &mut self,
        desktop_file: &DesktopFile,
        custom_app_run: Option<&Path>,
    ) -> bool {
        if custom_app_run.is_none() && !desktop_file.entry_exists("Desktop Entry", "Exec") {
            log::warn!(
                "desktop file {} has no Exec entry, cannot determine AppDir entry point",
                desktop_file.path().display()
            );
            return false;
        }

        log::info!(
            "Setting up AppDir root from desktop file {}",
            desktop_file.path().display()
        );
        true
    }

    fn execute_deferred_operations(&mut self) -> Result<(), AppDirError> {
        for (src, dst) in std::mem::take(&mut self.deferred) {
            if let Some(parent) = dst.parent() {
                std::fs::create_dir_all(parent).map_err(|source| AppDirError::Io {
                    context: "creating parent directory",
                    path: parent.to_path_buf(),
                    source,
                })?;
            }

            log::debug!("copying {} to {}", src.display(), dst.display());
            std::fs::copy(&src, &dst).map_err(|source| AppDirError::Io {
                context: "copying file to",
                path: dst.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_entry_reports_overwrites() {
        let mut desktop_file = DesktopFile::new("/tmp/app.desktop");

        let overwritten = desktop_file.set_entry("Desktop Entry", DesktopEntry::new("Name", "App"));
        assert!(!overwritten);

        let overwritten =
            desktop_file.set_entry("Desktop Entry", DesktopEntry::new("Name", "Other"));
        assert!(overwritten);

        let entry = desktop_file.get_entry("Desktop Entry", "Name");
        assert_eq!(entry.map(DesktopEntry::value), Some("Other"));
    }

    #[test]
    fn sections_are_independent() {
        let mut desktop_file = DesktopFile::new("/tmp/app.desktop");
        desktop_file.set_entry("Desktop Entry", DesktopEntry::new("Name", "App"));

        assert!(desktop_file.entry_exists("Desktop Entry", "Name"));
        assert!(!desktop_file.entry_exists("Desktop Action Edit", "Name"));
        assert!(!desktop_file.entry_exists("Desktop Entry", "Exec"));
    }

    #[test]
    fn create_builds_the_skeleton() {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let appdir_path = tmp.path().join("App.AppDir");

        let appdir = AppDir::create(&appdir_path).expect("failed to create AppDir");

        assert_eq!(appdir.path(), appdir_path);
        for subdir in ["usr/bin", "usr/lib", "usr/share/applications"] {
            assert!(appdir_path.join(subdir).is_dir(), "missing {subdir}");
        }
    }

    #[test]
    fn deferred_copies_run_in_one_batch() {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let src = tmp.path().join("AppRun");
        std::fs::write(&src, "#!/bin/sh\n").expect("failed to write source file");

        let mut appdir =
            AppDir::create(tmp.path().join("App.AppDir")).expect("failed to create AppDir");
        let dst = appdir.path().join("AppRun");

        appdir.deploy_file(&src, &dst);
        assert!(!dst.exists());

        appdir
            .execute_deferred_operations()
            .expect("deferred operations failed");
        assert!(dst.exists());
    }
}
