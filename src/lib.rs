//! # appdir_deploy
//!
//! Bundle Linux applications and their runtime dependencies into
//! self-contained AppDirs.
//!
//! The crate's core is a subprocess execution engine and a plugin
//! discovery/invocation protocol compatible with the linuxdeploy plugin
//! ecosystem: externally authored executables named
//! `linuxdeploy-plugin-<name>` are discovered on disk, queried for their
//! API level and type over a small command-line protocol, and run against
//! an AppDir with their output streamed to the log in real time.
//!
//! ## Usage
//!
//! ```bash
//! appdir_deploy --appdir AppDir                 # prepare the AppDir skeleton
//! appdir_deploy --appdir AppDir --plugin qt     # run the qt plugin against it
//! appdir_deploy --list-plugins                  # show everything discovered
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod appdir;
pub mod cli;
pub mod error;
pub mod plugin;
pub mod subprocess;

// Re-export main types for public API
pub use appdir::{AppDir, BundleManager, DesktopEntry, DesktopFile};
pub use error::{AppDirError, DeployError, PluginError, Result, SubprocessError};
pub use plugin::{ApiPlugin, PluginDescriptor, PluginRegistry, PluginRunner, PluginType, PluginV0};
pub use subprocess::{EnvOverlay, Process, StreamSource};
