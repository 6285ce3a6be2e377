//! streamr-monitor daemon library.
//!
//! The binary in `main.rs` is a thin wrapper; everything it wires together
//! lives here so integration tests can drive it directly.

pub mod cli;
pub mod commands;
pub mod health;
pub mod logging;
pub mod metrics_server;
pub mod orchestrator;
pub mod output;
pub mod pid_file;
pub mod provision;
