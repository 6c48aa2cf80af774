//! Environment overlays for child processes.

use std::ffi::{OsStr, OsString};

/// Ordered set of environment variables layered onto the inherited process
/// environment.
///
/// Overlay entries overwrite inherited entries with the same key. The
/// resolved environment consists of the inherited entries (matches removed)
/// followed by the overlay entries in insertion order.
#[derive(Debug, Clone, Default)]
pub struct EnvOverlay {
    entries: Vec<(String, String)>,
}

impl EnvOverlay {
    /// Create an empty overlay (the child inherits the environment as-is)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing an earlier overlay entry with the same key
    /// in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }

        self
    }

    /// Whether the overlay contains no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge the overlay with the current process environment.
    ///
    /// Inherited variables whose key matches an overlay entry are removed;
    /// the overlay entries are appended in insertion order. Keys are compared
    /// in full, not by prefix.
    pub fn resolved(&self) -> Vec<(OsString, OsString)> {
        let mut merged: Vec<(OsString, OsString)> = std::env::vars_os()
            .filter(|(key, _)| {
                !self
                    .entries
                    .iter()
                    .any(|(overlay_key, _)| OsStr::new(overlay_key) == key.as_os_str())
            })
            .collect();

        merged.extend(
            self.entries
                .iter()
                .map(|(key, value)| (OsString::from(key), OsString::from(value))),
        );

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_insertion_order() {
        let mut overlay = EnvOverlay::new();
        overlay.set("FIRST", "1").set("SECOND", "2").set("THIRD", "3");

        let keys: Vec<_> = overlay.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["FIRST", "SECOND", "THIRD"]);
    }

    #[test]
    fn setting_an_existing_key_updates_in_place() {
        let mut overlay = EnvOverlay::new();
        overlay.set("FIRST", "1").set("SECOND", "2").set("FIRST", "updated");

        let entries: Vec<_> = overlay.iter().collect();
        assert_eq!(entries, [("FIRST", "updated"), ("SECOND", "2")]);
    }

    #[test]
    fn resolved_environment_has_one_entry_per_key() {
        // PATH is guaranteed to exist in the test environment
        let mut overlay = EnvOverlay::new();
        overlay.set("PATH", "/overlay/bin");

        let resolved = overlay.resolved();
        let path_entries: Vec<_> = resolved.iter().filter(|(key, _)| key == "PATH").collect();

        assert_eq!(path_entries.len(), 1);
        assert_eq!(path_entries[0].1, "/overlay/bin");
    }

    #[test]
    fn overlay_entries_come_last() {
        let mut overlay = EnvOverlay::new();
        overlay.set("PATH", "/overlay/bin").set("APPDIR_DEPLOY_OVERLAY_ONLY", "x");

        let resolved = overlay.resolved();
        let tail: Vec<_> = resolved[resolved.len() - 2..]
            .iter()
            .map(|(key, _)| key.clone())
            .collect();

        assert_eq!(tail, ["PATH", "APPDIR_DEPLOY_OVERLAY_ONLY"]);
    }

    #[test]
    fn empty_overlay_resolves_to_inherited_environment() {
        let overlay = EnvOverlay::new();
        assert!(overlay.is_empty());
        assert_eq!(overlay.resolved().len(), std::env::vars_os().count());
    }
}
