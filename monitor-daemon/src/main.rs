//! streamr-monitor -- Streamr broker node monitor.
//!
//! Polls pm2 node logs, publishes node status and provisions node configs.

use anyhow::Result;
use clap::Parser;

use streamr_monitor::cli::{Command, DaemonCli};
use streamr_monitor::{commands, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // .env must be loaded before the config so legacy variables apply
    let env_file = commands::load_env_file(cli.env_file.as_deref())?;
    let config = commands::load_config(&cli).await?;

    logging::init_tracing(&config.general)?;
    if let Some(path) = &env_file {
        tracing::debug!(path = %path.display(), ".env file loaded");
    }

    match cli.resolved_command() {
        Command::Start(args) => commands::start(config, &args).await,
        Command::Init => commands::init(&config),
        Command::SetupNodes(args) => commands::setup_nodes(&config, &args),
        Command::Env => commands::env(&config),
    }
}
