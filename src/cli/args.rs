//! Command line argument parsing and validation.

use std::path::PathBuf;

use clap::Parser;

/// Bundle Linux applications into self-contained AppDirs
#[derive(Parser, Debug)]
#[command(
    name = "appdir_deploy",
    version,
    about = "Bundle Linux applications into self-contained AppDirs",
    long_about = "Bundle a Linux application and its runtime dependencies into a \
self-contained AppDir, then run linuxdeploy-compatible bundling plugins against it.

Usage:
  appdir_deploy --appdir AppDir
  appdir_deploy --appdir AppDir --plugin qt --plugin gstreamer
  appdir_deploy --list-plugins"
)]
pub struct Args {
    /// Path to the AppDir to operate on
    #[arg(long, value_name = "PATH", env = "APPDIR")]
    pub appdir: Option<PathBuf>,

    /// Plugins to run against the AppDir, in the given order (input-type
    /// plugins run before output-type plugins)
    #[arg(long = "plugin", value_name = "NAME")]
    pub plugins: Vec<String>,

    /// Additional plugin search directories, highest priority first
    /// (searched before the executable's directory and $PATH)
    #[arg(long = "plugin-dir", value_name = "PATH")]
    pub plugin_dirs: Vec<PathBuf>,

    /// List all discovered plugins and exit
    #[arg(long)]
    pub list_plugins: bool,

    /// Emit the plugin listing as JSON
    #[arg(long, requires = "list_plugins")]
    pub json: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.list_plugins && self.appdir.is_none() {
            return Err("--appdir is required unless --list-plugins is given".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appdir_is_required_for_plugin_runs() {
        let args = Args {
            appdir: None,
            plugins: vec!["qt".to_string()],
            plugin_dirs: Vec::new(),
            list_plugins: false,
            json: false,
        };

        assert!(args.validate().is_err());
    }

    #[test]
    fn listing_does_not_need_an_appdir() {
        let args = Args {
            appdir: None,
            plugins: Vec::new(),
            plugin_dirs: Vec::new(),
            list_plugins: true,
            json: false,
        };

        assert!(args.validate().is_ok());
    }
}
