//! Tracing setup for the monitor daemon.
//!
//! All diagnostics go to stderr. Stdout belongs to the `env`, `init` and
//! `setup-nodes` commands, whose output is meant to be read or piped.

use std::io::IsTerminal;

use anyhow::{Result, bail};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use streamr_monitor_core::config::GeneralConfig;

type FmtLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber from `[general]`.
///
/// The level comes from `RUST_LOG` when it is set, otherwise from
/// `log_level` (already merged with `--log-level`). Fails if a subscriber
/// is already installed or `log_format` is neither `json` nor `pretty`.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let fmt_layer = fmt_layer(&config.log_format)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize {} logging: {e}", config.log_format))
}

/// `json` emits one object per event for log shippers. `pretty` is for a
/// terminal and only colors output when stderr is one.
fn fmt_layer(format: &str) -> Result<FmtLayer> {
    let layer = match format {
        "json" => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
        "pretty" => fmt::layer()
            .pretty()
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr)
            .boxed(),
        other => bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };
    Ok(layer)
}
