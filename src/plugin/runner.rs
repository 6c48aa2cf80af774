//! Plugin invocation with real-time output forwarding.

use std::path::{Path, PathBuf};

use super::descriptor::PluginDescriptor;
use crate::error::SubprocessError;
use crate::subprocess::stream::{StreamSource, forward_lines};
use crate::subprocess::{EnvOverlay, Process};

/// Runs one plugin against a target AppDir.
///
/// The plugin's output is forwarded to the log line by line while it
/// executes, never buffered until completion. Plugin process resources do
/// not outlive a single [`run`](Self::run) call.
#[derive(Debug)]
pub struct PluginRunner {
    name: String,
    path: PathBuf,
}

impl PluginRunner {
    /// Create a runner for the plugin described by `descriptor`
    pub fn new(descriptor: &PluginDescriptor) -> Self {
        Self {
            name: descriptor.name().to_string(),
            path: descriptor.path().to_path_buf(),
        }
    }

    /// Run the plugin with `appdir` as its sole argument.
    ///
    /// The `LINUXDEPLOY` environment variable is set to the running
    /// executable so plugins can call back into the tool. Standard output is
    /// logged at info level, standard error at warn level, interleaved in
    /// arrival order. Returns the plugin's exit code unchanged; deciding
    /// whether a nonzero code aborts the overall run is up to the caller.
    pub async fn run(&self, appdir: &Path) -> Result<i32, SubprocessError> {
        let mut env = EnvOverlay::new();
        if let Ok(current_exe) = std::env::current_exe() {
            env.set("LINUXDEPLOY", current_exe.display().to_string());
        }

        let args = vec![self.path.display().to_string(), appdir.display().to_string()];
        log::info!("Running plugin {}: {}", self.name, args.join(" "));

        let mut process = Process::spawn(&args, &env)?;
        let stdout = process.take_stdout();
        let stderr = process.take_stderr();

        let name = self.name.as_str();
        forward_lines(stdout, stderr, |source, line| match source {
            StreamSource::Stdout => log::info!("[{name}/stdout] {line}"),
            StreamSource::Stderr => log::warn!("[{name}/stderr] {line}"),
        })
        .await;

        process.close().await
    }
}
