//! rigwatch daemon: configuration and long-running jobs.
//!
//! The binary in `main.rs` wires the services together; everything it
//! spawns lives here so it can be tested without a process.

pub mod background;
pub mod config;
pub mod shutdown;

pub use config::{DaemonConfig, WarmupConfig};
