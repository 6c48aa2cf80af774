//! Error types for appdir_deploy operations.
//!
//! This module defines all error types with actionable error messages,
//! grouped by subsystem and wrapped into a single top-level error.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for appdir_deploy operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Main error type for all appdir_deploy operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Subprocess execution errors
    #[error("Subprocess error: {0}")]
    Subprocess(#[from] SubprocessError),

    /// Plugin discovery and validation errors
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// AppDir deployment errors
    #[error("AppDir error: {0}")]
    AppDir(#[from] AppDirError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Subprocess execution errors
#[derive(Error, Debug)]
pub enum SubprocessError {
    /// Empty command line passed to spawn
    #[error("cannot spawn a process from an empty command")]
    EmptyCommand,

    /// Pipe creation or process creation failed
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        /// Command line that could not be started
        command: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Waiting for a child process failed, or the child reported a state
    /// that is neither a normal exit nor a signal termination. Signals an
    /// internal invariant violation and is never retried.
    #[error("failed to wait for child {pid}: {reason}")]
    Wait {
        /// Process identifier of the child
        pid: u32,
        /// Description of the failure
        reason: String,
    },

    /// Signal delivery or the subsequent wait failed during kill
    #[error("failed to kill child {pid}: {reason}")]
    Kill {
        /// Process identifier of the child
        pid: u32,
        /// Description of the failure
        reason: String,
    },

    /// A command run through `check_output` exited with a nonzero code
    #[error("'{command}' exited with code {code}")]
    NonZeroExit {
        /// Command line that failed
        command: String,
        /// Exit code reported by the child
        code: i32,
        /// Captured standard error text
        stderr: String,
    },
}

/// Plugin discovery and validation errors
#[derive(Error, Debug)]
pub enum PluginError {
    /// Plugin path does not exist
    #[error("no such file or directory: {path}")]
    NotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// Plugin file name does not match the plugin naming scheme
    #[error("not a valid plugin file name: {path}")]
    InvalidName {
        /// Path whose file name failed to match
        path: PathBuf,
    },

    /// Plugin reports an API level other than the one required by the caller
    #[error("plugin {path} implements API level {found}, required level is {expected}")]
    WrongApiLevel {
        /// Path of the offending plugin
        path: PathBuf,
        /// API level the caller is bound to
        expected: i32,
        /// API level the plugin reported
        found: i32,
    },
}

/// AppDir deployment errors
#[derive(Error, Debug)]
pub enum AppDirError {
    /// A desktop file deployed earlier can no longer be found among the
    /// deployed desktop files
    #[error("desktop file deployed earlier is no longer reachable: {name}")]
    DesktopFileMissing {
        /// File name of the missing desktop file
        name: String,
    },

    /// Filesystem operation failed
    #[error("{context} {path}: {source}")]
    Io {
        /// Operation that failed (e.g. "copying file to")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
}
