//! Subcommand handlers.
//!
//! Each handler receives the fully resolved configuration (file, `.env`,
//! environment variables and CLI overrides already applied).

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use streamr_monitor_core::config::{MonitorConfig, ProvisioningConfig, expand_home};

use crate::cli::{DEFAULT_CONFIG_PATH, DaemonCli, SetupNodesArgs, StartArgs};
use crate::orchestrator::Orchestrator;
use crate::output::{self, Render};
use crate::provision::{self, ProvisionPaths};

/// Environment variable naming the `.env` file when `--env-file` is absent.
pub const ENV_FILE_VAR: &str = "STREAMR_MONITOR_PROVISIONING_ENV_FILE";

/// Placeholder printed instead of a configured API key.
const REDACTED: &str = "<redacted>";

/// Load the `.env` file into the process environment.
///
/// Variables already set in the environment are not overwritten. A missing
/// default file is not an error; a missing file passed with `--env-file`
/// is. Returns the path that was loaded.
pub fn load_env_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_env_file(),
    };

    if !path.is_file() {
        if explicit.is_some() {
            anyhow::bail!(".env file {} not found", path.display());
        }
        return Ok(None);
    }

    dotenv::from_path(&path)
        .with_context(|| format!("failed to load .env file {}", path.display()))?;
    Ok(Some(path))
}

fn default_env_file() -> PathBuf {
    match std::env::var(ENV_FILE_VAR) {
        Ok(path) if !path.trim().is_empty() => expand_home(&path),
        _ => expand_home(&ProvisioningConfig::default().env_file),
    }
}

/// Resolve the effective configuration for `cli`.
///
/// An explicit `--config` must exist; the default location is optional.
/// CLI overrides are applied last and the result is validated again.
pub async fn load_config(cli: &DaemonCli) -> Result<MonitorConfig> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load(path)
            .await
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let path = expand_home(DEFAULT_CONFIG_PATH);
            MonitorConfig::load_or_default(&path)
                .await
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
    };

    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    Ok(config)
}

/// `start`: validate, bootstrap, run one cycle or run the daemon.
pub async fn start(config: MonitorConfig, args: &StartArgs) -> Result<()> {
    if args.validate {
        output::print(&Validated {
            nodes: config.nodes.ids.clone(),
        })?;
        return Ok(());
    }

    if !config.has_nodes() {
        tracing::warn!(
            "no nodes configured, initializing config files instead of polling; \
             run `streamr-monitor setup-nodes <server-index> <count>` next"
        );
        let report = provision::init(&ProvisionPaths::from_config(&config.provisioning))?;
        output::print(&report)?;
        return Ok(());
    }

    let mut orchestrator = Orchestrator::build_from_config(config)?;

    if args.once {
        let report = orchestrator.run_once().await?;
        tracing::info!(
            cycle = report.cycle,
            dispatched = report.dispatched,
            read_failures = report.read_failures,
            "single poll cycle finished"
        );
        return Ok(());
    }

    tracing::info!("streamr-monitor starting");
    orchestrator.run().await?;
    tracing::info!("streamr-monitor shut down");
    Ok(())
}

/// `init`: create directories and seed templates.
pub fn init(config: &MonitorConfig) -> Result<()> {
    let report = provision::init(&ProvisionPaths::from_config(&config.provisioning))?;
    output::print(&report)?;
    Ok(())
}

/// `setup-nodes`: write broker configs and update `.env` / `nodes.yml`.
pub fn setup_nodes(config: &MonitorConfig, args: &SetupNodesArgs) -> Result<()> {
    let paths = ProvisionPaths::from_config(&config.provisioning);
    let report = provision::setup_nodes(&paths, &args.server_index, args.count)?;
    output::print(&report)?;
    Ok(())
}

/// `env`: print the effective configuration.
pub fn env(config: &MonitorConfig) -> Result<()> {
    let report = EnvReport::from_config(config)?;
    output::print(&report)?;
    Ok(())
}

/// Effective configuration rendered as TOML.
#[derive(Debug, Serialize)]
pub struct EnvReport {
    pub config_toml: String,
}

impl EnvReport {
    /// Serialize `config` with the API key redacted.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let mut config = config.clone();
        if !config.publisher.api_key.is_empty() {
            config.publisher.api_key = REDACTED.to_owned();
        }
        let config_toml =
            toml::to_string_pretty(&config).context("failed to serialize configuration")?;
        Ok(Self { config_toml })
    }
}

impl Render for EnvReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write!(w, "{}", self.config_toml)
    }
}

#[derive(Debug, Serialize)]
struct Validated {
    nodes: Vec<String>,
}

impl Render for Validated {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Configuration is valid")?;
        if self.nodes.is_empty() {
            writeln!(w, "No nodes configured (start will initialize config files)")
        } else {
            writeln!(w, "Nodes: {}", self.nodes.join(", "))
        }
    }
}
