//! Plugin descriptors: validated, named, versioned handles to discovered
//! plugin executables.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{PluginError, SubprocessError};
use crate::subprocess::{EnvOverlay, Process};

/// API level a plugin reports when its `--plugin-api-version` response is
/// missing or unparseable
pub const UNKNOWN_API_LEVEL: i32 = -1;

/// Whether a plugin runs during dependency collection (input) or consumes a
/// finished AppDir (output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    /// Deploys additional resources into the AppDir
    Input,
    /// Turns the finished AppDir into some other artifact
    Output,
}

impl PluginType {
    /// Lowercase protocol name of the type ("input" or "output")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Extract the plugin name from a path's file name.
///
/// The scheme is the literal prefix `linuxdeploy-plugin-`, a name segment
/// free of whitespace, dots and dashes, and an optional dotted suffix such
/// as a script extension.
pub(crate) fn name_from_path(path: &Path) -> Option<String> {
    static PLUGIN_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^linuxdeploy-plugin-([^\s.-]+)(?:\..+)?$").expect("plugin name regex is valid")
    });

    let file_name = path.file_name()?.to_str()?;
    PLUGIN_NAME_RE
        .captures(file_name)
        .map(|caps| caps[1].to_string())
}

/// A validated handle to one discovered plugin executable.
///
/// Construction queries the executable over the plugin command-line
/// protocol. A descriptor is built even when the reported API level is
/// unknown or unwanted; compatibility is checked later by [`ApiPlugin`],
/// not at discovery time.
#[derive(Debug, Clone, Serialize)]
pub struct PluginDescriptor {
    path: PathBuf,
    name: String,
    api_level: i32,
    #[serde(rename = "type")]
    plugin_type: PluginType,
}

impl PluginDescriptor {
    /// Build a descriptor for the executable at `path`.
    ///
    /// # Errors
    ///
    /// [`PluginError::NotFound`] if the path does not exist,
    /// [`PluginError::InvalidName`] if the file name does not match the
    /// plugin naming scheme. Protocol query failures are not errors: they
    /// degrade to [`UNKNOWN_API_LEVEL`] and [`PluginType::Input`].
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self, PluginError> {
        let path = path.into();

        if !path.exists() {
            return Err(PluginError::NotFound { path });
        }

        let name = match name_from_path(&path) {
            Some(name) => name,
            None => return Err(PluginError::InvalidName { path }),
        };

        let api_level = query_api_level(&path).await;
        let plugin_type = query_plugin_type(&path).await;

        Ok(Self {
            path,
            name,
            api_level,
            plugin_type,
        })
    }

    /// Path of the plugin executable
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name derived from the file name (e.g. `qt` for
    /// `linuxdeploy-plugin-qt.sh`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Self-reported API level, or [`UNKNOWN_API_LEVEL`]
    pub fn api_level(&self) -> i32 {
        self.api_level
    }

    /// Self-reported plugin type, defaulting to input
    pub fn plugin_type(&self) -> PluginType {
        self.plugin_type
    }

    /// Protocol name of the plugin type ("input" or "output")
    pub fn type_string(&self) -> &'static str {
        self.plugin_type.as_str()
    }
}

/// A plugin bound to one required API level.
///
/// Wrapping a [`PluginDescriptor`] fails immediately when the descriptor's
/// level differs, even though the descriptor itself constructed fine.
#[derive(Debug, Clone)]
pub struct ApiPlugin<const API_LEVEL: i32> {
    descriptor: PluginDescriptor,
}

/// Plugin bound to API level 0, the current protocol level
pub type PluginV0 = ApiPlugin<0>;

impl<const API_LEVEL: i32> ApiPlugin<API_LEVEL> {
    /// Bind `descriptor` to this wrapper's API level.
    ///
    /// # Errors
    ///
    /// [`PluginError::WrongApiLevel`] if the descriptor reports any other
    /// level, including [`UNKNOWN_API_LEVEL`].
    pub fn new(descriptor: PluginDescriptor) -> Result<Self, PluginError> {
        if descriptor.api_level() != API_LEVEL {
            return Err(PluginError::WrongApiLevel {
                path: descriptor.path().to_path_buf(),
                expected: API_LEVEL,
                found: descriptor.api_level(),
            });
        }

        Ok(Self { descriptor })
    }

    /// The wrapped descriptor
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Run the plugin against `appdir`, streaming its output to the log.
    ///
    /// Returns the plugin's exit code unchanged.
    pub async fn run(&self, appdir: &Path) -> Result<i32, SubprocessError> {
        super::PluginRunner::new(&self.descriptor).run(appdir).await
    }
}

/// Ask the executable for its API level via `--plugin-api-version`.
///
/// The entire standard output text, trimmed, must parse as a single
/// integer. Any failure yields [`UNKNOWN_API_LEVEL`] with a warning; none
/// of them is fatal to descriptor construction.
async fn query_api_level(path: &Path) -> i32 {
    let output = match query(path, "--plugin-api-version").await {
        Ok(output) => output,
        Err(e) => {
            log::warn!("{}: {}", path.display(), e);
            return UNKNOWN_API_LEVEL;
        }
    };

    if output.is_empty() {
        log::warn!(
            "received empty response from plugin {} while querying --plugin-api-version",
            path.display()
        );
        return UNKNOWN_API_LEVEL;
    }

    match output.trim().parse::<i32>() {
        Ok(api_level) => api_level,
        Err(_) => {
            log::warn!(
                "plugin {} reports a non-numeric API version: {:?}",
                path.display(),
                output.trim()
            );
            UNKNOWN_API_LEVEL
        }
    }
}

/// Ask the executable for its type via `--plugin-type`.
///
/// Only the first line of output counts: `input` or `output`. Anything
/// else, including a failing or missing implementation of the flag,
/// silently selects input.
async fn query_plugin_type(path: &Path) -> PluginType {
    let output = match query(path, "--plugin-type").await {
        Ok(output) => output,
        Err(e) => {
            log::debug!("{}: {}, assuming input type", path.display(), e);
            return PluginType::Input;
        }
    };

    match output.lines().next() {
        Some("input") | None => PluginType::Input,
        Some("output") => PluginType::Output,
        Some(other) => {
            log::debug!(
                "plugin {} reports unknown type {:?}, assuming input",
                path.display(),
                other
            );
            PluginType::Input
        }
    }
}

async fn query(path: &Path, flag: &str) -> Result<String, SubprocessError> {
    let args = vec![path.display().to_string(), flag.to_string()];
    Process::spawn(&args, &EnvOverlay::default())?
        .check_output()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_extracted_from_suffixed_file_name() {
        let name = name_from_path(Path::new("/usr/bin/linuxdeploy-plugin-qt.sh"));
        assert_eq!(name.as_deref(), Some("qt"));
    }

    #[test]
    fn name_is_extracted_from_bare_file_name() {
        let name = name_from_path(Path::new("linuxdeploy-plugin-gtk"));
        assert_eq!(name.as_deref(), Some("gtk"));
    }

    #[test]
    fn unrelated_file_names_do_not_match() {
        assert_eq!(name_from_path(Path::new("linuxdeploy")), None);
        assert_eq!(name_from_path(Path::new("some-other-tool.sh")), None);
    }

    #[test]
    fn empty_name_segment_does_not_match() {
        assert_eq!(name_from_path(Path::new("linuxdeploy-plugin-")), None);
        assert_eq!(name_from_path(Path::new("linuxdeploy-plugin-.sh")), None);
    }

    #[test]
    fn name_segment_must_not_contain_separators() {
        assert_eq!(name_from_path(Path::new("linuxdeploy-plugin-foo-bar")), None);
        assert_eq!(name_from_path(Path::new("linuxdeploy-plugin-foo bar")), None);
    }
}
