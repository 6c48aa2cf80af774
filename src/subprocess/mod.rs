//! Subprocess execution engine.
//!
//! Spawns external programs with their standard output and standard error
//! connected to dedicated pipes, and provides lifecycle management (wait,
//! kill, non-blocking liveness checks) plus real-time output multiplexing.
//!
//! Pipe buffers are bounded: a caller that lets a child produce substantial
//! output on both streams without draining both will deadlock. Streaming
//! consumers must therefore service both streams concurrently, which is what
//! [`stream::forward_lines`] does.

mod env;
mod process;
pub mod stream;

pub use env::EnvOverlay;
pub use process::Process;
pub use stream::StreamSource;

#[cfg(unix)]
pub use nix::sys::signal::Signal;
