//! Daemon orchestration -- assembly and lifecycle management.
//!
//! The [`Orchestrator`] owns the validated configuration and the status
//! pipeline. It installs the metrics recorder, writes the PID file, starts
//! the pipeline, logs health changes and performs graceful shutdown on
//! `SIGTERM` / `SIGINT`.
//!
//! # Shutdown Order
//!
//! 1. Stop background tasks (uptime updater)
//! 2. Stop the pipeline (cancel the poller, drain in-flight publishes)
//! 3. Remove the PID file

use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use streamr_monitor_core::config::MonitorConfig;
use streamr_monitor_core::metrics as m;
use streamr_monitor_core::pipeline::{HealthStatus, Pipeline};
use streamr_monitor_log_pipeline::{
    CycleReport, PipelineConfig, StatusPipeline, StatusPipelineBuilder, build_publisher,
};

use crate::health::{CycleSummary, DaemonHealth, log_health};
use crate::metrics_server;
use crate::pid_file::PidFile;

/// Interval of the uptime metric updater.
const UPTIME_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: MonitorConfig,
    /// Node status pipeline.
    pipeline: StatusPipeline,
    /// Shutdown broadcast sender (signals all background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration from `config_path` and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, validation
    /// fails, or the pipeline cannot be built.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = MonitorConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// At least one node must be configured; an empty node list is the
    /// bootstrap path and handled by the caller.
    pub fn build_from_config(config: MonitorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if !config.has_nodes() {
            return Err(anyhow::anyhow!(
                "no nodes configured; set [nodes].ids or PM2_NAMES, or run `streamr-monitor setup-nodes`"
            ));
        }

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            record_daemon_metrics();
        }

        let publisher = build_publisher(&config.publisher)
            .map_err(|e| anyhow::anyhow!("failed to build publisher: {}", e))?;
        let pipeline = StatusPipelineBuilder::new()
            .config(PipelineConfig::from_core(&config))
            .publisher(publisher)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build status pipeline: {}", e))?;

        tracing::info!(
            nodes = %config.nodes.ids.join(","),
            interval_secs = config.nodes.poll_interval_secs,
            publishing = config.publisher.enabled,
            "orchestrator initialized"
        );

        let (shutdown_tx, _) = broadcast::channel(4);
        Ok(Self {
            config,
            pipeline,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Run until `SIGTERM` or `SIGINT` is received.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(wait_for_shutdown_signal()).await
    }

    /// Start the pipeline and run until `shutdown` resolves.
    ///
    /// `shutdown` yields the name of the trigger, or an error if the trigger
    /// could not be installed; the daemon shuts down cleanly in both cases.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<&'static str>>,
    {
        let _pid_file = if self.config.general.pid_file.is_empty() {
            None
        } else {
            Some(PidFile::create(&self.config.general.pid_file)?)
        };

        self.pipeline
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start status pipeline: {}", e))?;

        let mut uptime_updater_task = if self.config.metrics.enabled {
            Some(spawn_uptime_updater(
                self.start_time,
                self.shutdown_tx.subscribe(),
            ))
        } else {
            None
        };

        tracing::info!("entering main loop");
        let mut health_tick =
            tokio::time::interval(Duration::from_secs(self.config.nodes.poll_interval_secs));
        health_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_status: Option<HealthStatus> = None;

        tokio::pin!(shutdown);
        let signal = loop {
            tokio::select! {
                signal = &mut shutdown => break signal,
                _ = health_tick.tick() => {
                    let health = self.health().await;
                    if last_status.as_ref() != Some(&health.status) {
                        log_health(&health);
                        last_status = Some(health.status);
                    }
                }
            }
        };

        match &signal {
            Ok(name) => tracing::info!(signal = name, "shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "shutdown trigger failed, shutting down"),
        }

        let _ = self.shutdown_tx.send(());
        if let Some(task) = uptime_updater_task.take() {
            let _ = task.await;
        }

        self.shutdown().await?;
        signal.map(|_| ())
    }

    /// Run a single poll cycle and wait for its publishes.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        self.pipeline
            .run_once()
            .await
            .map_err(|e| anyhow::anyhow!("poll cycle failed: {}", e))
    }

    /// Stop the pipeline.
    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping status pipeline");
        self.pipeline.stop().await.map_err(Into::into)
    }

    /// Current daemon health.
    pub async fn health(&self) -> DaemonHealth {
        let uptime_secs = self.start_time.elapsed().as_secs();

        if self.config.metrics.enabled {
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
        }

        DaemonHealth {
            status: self.pipeline.health_check().await,
            uptime_secs,
            pipeline_state: self.pipeline.state_name().to_owned(),
            nodes: self.config.nodes.ids.len(),
            last_cycle: self.pipeline.last_report().as_ref().map(CycleSummary::from),
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Record build info once during initialization.
fn record_daemon_metrics() {
    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}

/// Spawn a background task that periodically updates the uptime metric.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_UPDATE_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS)
                        .set(start_time.elapsed().as_secs() as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}
