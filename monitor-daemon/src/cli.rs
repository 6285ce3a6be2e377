//! CLI argument definitions for streamr-monitor.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use streamr_monitor_core::config::MonitorConfig;

/// Default configuration file location (a missing file means defaults).
pub const DEFAULT_CONFIG_PATH: &str = "~/.streamr-monitor/config/streamr-monitor.toml";

/// Streamr broker node monitor.
///
/// Polls the pm2 log files of locally running Streamr broker nodes,
/// extracts their status and publishes it to a stream.
#[derive(Parser, Debug)]
#[command(name = "streamr-monitor")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to streamr-monitor.toml. Fails if the file does not exist.
    ///
    /// Defaults to ~/.streamr-monitor/config/streamr-monitor.toml (optional).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the .env file holding legacy variables (PM2_NAMES, STREAM_ID, ...).
    ///
    /// Defaults to ~/.streamr-monitor/config/.env (optional).
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Override PID file path (takes precedence over config file).
    #[arg(long, global = true)]
    pub pid_file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start polling node logs and publishing their status (default).
    Start(StartArgs),

    /// Create the config directories and seed the .env and nodes.yml templates.
    Init,

    /// Write broker configs for a server's nodes and update .env / nodes.yml.
    SetupNodes(SetupNodesArgs),

    /// Print the effective configuration as TOML (API key redacted).
    Env,
}

/// Options for `start`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct StartArgs {
    /// Run a single poll cycle, wait for its publishes and exit.
    #[arg(long)]
    pub once: bool,

    /// Validate configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

/// Arguments for `setup-nodes`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SetupNodesArgs {
    /// Server index used as node id prefix (`{server_index}-{n}`).
    pub server_index: String,

    /// Number of nodes to provision on this server.
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,
}

impl DaemonCli {
    /// The requested subcommand; `start` when none is given.
    pub fn resolved_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Start(StartArgs::default()))
    }

    /// Apply CLI overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut MonitorConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
        if let Some(pid_file) = &self.pid_file {
            config.general.pid_file.clone_from(pid_file);
        }
        if let Some(env_file) = &self.env_file {
            config.provisioning.env_file = env_file.display().to_string();
        }
    }
}
