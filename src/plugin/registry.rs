//! Plugin discovery sweeps over search directories.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::descriptor::{PluginDescriptor, name_from_path};

/// The plugins found by one discovery sweep.
///
/// Descriptors are deduplicated by name; the first discovered entry for a
/// given name wins, so callers must order search directories by descending
/// priority to get override semantics.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginDescriptor>,
}

impl PluginRegistry {
    /// Scan `directories` in priority order and build a descriptor per
    /// matching executable.
    ///
    /// Candidates are regular, executable files whose name matches the
    /// plugin naming scheme. Entries failing validation are skipped with a
    /// warning; unreadable directories are skipped as well. The sweep itself
    /// never fails.
    pub async fn discover(directories: &[PathBuf]) -> Self {
        let mut plugins: Vec<PluginDescriptor> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for directory in directories {
            let entries = match std::fs::read_dir(directory) {
                Ok(entries) => entries,
                Err(e) => {
                    log::debug!(
                        "skipping plugin search directory {}: {}",
                        directory.display(),
                        e
                    );
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();

                if !is_executable_file(&path) {
                    continue;
                }

                let Some(name) = name_from_path(&path) else {
                    continue;
                };

                if seen.contains(&name) {
                    log::debug!(
                        "plugin {} already registered, ignoring {}",
                        name,
                        path.display()
                    );
                    continue;
                }

                match PluginDescriptor::new(&path).await {
                    Ok(descriptor) => {
                        log::debug!(
                            "found plugin {} (API level {}) at {}",
                            descriptor.name(),
                            descriptor.api_level(),
                            path.display()
                        );
                        seen.insert(name);
                        plugins.push(descriptor);
                    }
                    Err(e) => {
                        log::warn!("skipping plugin candidate {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self { plugins }
    }

    /// Default search directories: the running executable's directory
    /// followed by the `$PATH` entries, highest priority first.
    pub fn default_search_directories() -> Vec<PathBuf> {
        let mut directories = Vec::new();

        if let Ok(current_exe) = std::env::current_exe()
            && let Some(exe_dir) = current_exe.parent()
        {
            directories.push(exe_dir.to_path_buf());
        }

        if let Some(path_var) = std::env::var_os("PATH") {
            directories.extend(std::env::split_paths(&path_var));
        }

        directories
    }

    /// Look up a plugin by its derived name
    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|plugin| plugin.name() == name)
    }

    /// Iterate over the discovered plugins in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.iter()
    }

    /// Number of discovered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the sweep found no plugins
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };

    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if metadata.permissions().mode() & 0o111 == 0 {
            return false;
        }
    }

    true
}
