//! Plugin discovery and invocation.
//!
//! Plugins are externally authored executables extending the bundling
//! process. They are discovered by file name (prefix `linuxdeploy-plugin-`,
//! the ecosystem naming scheme this tool is compatible with) and queried
//! over a small command-line protocol:
//!
//! | Invocation | Expected response |
//! |---|---|
//! | `<plugin> --plugin-api-version` | single integer line |
//! | `<plugin> --plugin-type` | first line `input` or `output` |
//! | `<plugin> <appdir>` | arbitrary output, exit code propagated |

mod descriptor;
mod registry;
mod runner;

pub use descriptor::{ApiPlugin, PluginDescriptor, PluginType, PluginV0, UNKNOWN_API_LEVEL};
pub use registry::PluginRegistry;
pub use runner::PluginRunner;
