//! Command line interface for appdir_deploy.
//!
//! Discovers plugins, prepares the AppDir and runs the requested plugin
//! chain, mapping failures to the tool's exit code.

mod args;

pub use args::Args;

use anyhow::Context;

use crate::appdir::{AppDir, BundleManager};
use crate::error::Result;
use crate::plugin::{PluginDescriptor, PluginRegistry, PluginRunner, PluginType};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    run_with(args).await
}

/// Execute a parsed argument set and return the process exit code
pub async fn run_with(args: Args) -> Result<i32> {
    if let Err(reason) = args.validate() {
        log::error!("{reason}");
        return Ok(2);
    }

    let mut search_directories = args.plugin_dirs.clone();
    search_directories.extend(PluginRegistry::default_search_directories());

    let registry = PluginRegistry::discover(&search_directories).await;
    log::debug!("discovered {} plugin(s)", registry.len());

    if args.list_plugins {
        list_plugins(&registry, args.json)?;
        return Ok(0);
    }

    let appdir_path = args.appdir.clone().context("--appdir is required")?;
    let appdir = AppDir::create(&appdir_path)?;
    log::info!("Using AppDir {}", appdir.path().display());

    let mut selected: Vec<&PluginDescriptor> = Vec::new();
    for name in &args.plugins {
        match registry.get(name) {
            Some(descriptor) => selected.push(descriptor),
            None => {
                log::error!("No plugin found for name: {name}");
                return Ok(1);
            }
        }
    }

    // input plugins run before output plugins; user order is kept otherwise
    selected.sort_by_key(|descriptor| descriptor.plugin_type() == PluginType::Output);

    for descriptor in selected {
        let exit_code = PluginRunner::new(descriptor).run(&appdir_path).await?;

        if exit_code != 0 {
            log::error!(
                "Plugin {} exited with code {exit_code}",
                descriptor.name()
            );
            return Ok(exit_code);
        }

        log::info!("Plugin {} finished successfully", descriptor.name());
    }

    Ok(0)
}

fn list_plugins(registry: &PluginRegistry, as_json: bool) -> Result<()> {
    if as_json {
        let plugins: Vec<&PluginDescriptor> = registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&plugins)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No plugins found");
        return Ok(());
    }

    for plugin in registry.iter() {
        println!(
            "{} ({}, API level {}): {}",
            plugin.name(),
            plugin.type_string(),
            plugin.api_level(),
            plugin.path().display()
        );
    }

    Ok(())
}
