//! 파이프라인 오케스트레이션 -- 폴러 태스크의 생명주기를 관리합니다.
//!
//! [`StatusPipeline`]은 core의 [`Pipeline`](streamr_monitor_core::pipeline::Pipeline) trait을 구현하여
//! 데몬에서 start/stop/health_check로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! StatusPipeline --spawn--> StatusPoller::run(cancel) --watch--> 마지막 CycleReport
//!                                 |
//!                                 +--> JoinSet<publish> (fire-and-forget)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use streamr_monitor_core::error::{MonitorError, PipelineError};
use streamr_monitor_core::pipeline::{HealthStatus, Pipeline, StatusPublisher};

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::poller::{CycleReport, StatusPoller};
use crate::publisher::LogPublisher;

/// 파이프라인 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 노드 상태 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use streamr_monitor_log_pipeline::StatusPipelineBuilder;
///
/// let mut pipeline = StatusPipelineBuilder::new()
///     .config(config)
///     .publisher(publisher)
///     .build()?;
///
/// pipeline.start().await?;
/// ```
pub struct StatusPipeline {
    config: PipelineConfig,
    state: PipelineState,
    /// 정지 상태일 때 보관하는 폴러 (실행 중에는 태스크가 소유)
    poller: Option<StatusPoller>,
    task: Option<JoinHandle<StatusPoller>>,
    cancel: CancellationToken,
    report_tx: watch::Sender<Option<CycleReport>>,
    report_rx: watch::Receiver<Option<CycleReport>>,
}

impl StatusPipeline {
    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 파이프라인 설정
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 마지막 사이클 결과를 반환합니다.
    pub fn last_report(&self) -> Option<CycleReport> {
        self.report_rx.borrow().clone()
    }

    /// 사이클 결과 구독 채널을 반환합니다.
    pub fn subscribe_reports(&self) -> watch::Receiver<Option<CycleReport>> {
        self.report_rx.clone()
    }

    fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.config.publish_drain_timeout_secs)
    }

    /// 사이클을 한 번만 실행하고 발행이 끝날 때까지 기다립니다.
    ///
    /// 실행 중에는 호출할 수 없습니다.
    pub async fn run_once(&mut self) -> Result<CycleReport, MonitorError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }
        let mut poller = self
            .poller
            .take()
            .ok_or_else(|| PipelineError::InitFailed("poller unavailable".to_owned()))?;

        let report = poller.run_cycle().await;
        poller.drain_publishes(self.drain_timeout()).await;
        self.poller = Some(poller);
        self.report_tx.send_replace(Some(report.clone()));
        Ok(report)
    }
}

impl Pipeline for StatusPipeline {
    async fn start(&mut self) -> Result<(), MonitorError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let poller = self
            .poller
            .take()
            .ok_or_else(|| PipelineError::InitFailed("poller unavailable".to_owned()))?;

        tracing::info!(
            nodes = self.config.node_ids.len(),
            interval_secs = self.config.poll_interval_secs,
            "starting status pipeline"
        );

        self.cancel = CancellationToken::new();
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        self.task = Some(tokio::spawn(poller.run(
            interval,
            self.cancel.clone(),
            self.report_tx.clone(),
        )));

        self.state = PipelineState::Running;
        tracing::info!("status pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), MonitorError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        tracing::info!("stopping status pipeline");
        self.cancel.cancel();

        let task = self.task.take();
        self.state = PipelineState::Stopped;

        if let Some(task) = task {
            match task.await {
                Ok(mut poller) => {
                    let in_flight = poller.in_flight_publishes();
                    if in_flight > 0 {
                        tracing::info!(count = in_flight, "draining in-flight publishes");
                    }
                    poller.drain_publishes(self.drain_timeout()).await;
                    self.poller = Some(poller);
                }
                Err(e) => {
                    return Err(PipelineError::TaskFailed(e.to_string()).into());
                }
            }
        }

        tracing::info!("status pipeline stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                if self.task.as_ref().is_some_and(JoinHandle::is_finished) {
                    return HealthStatus::Unhealthy("poller task exited".to_owned());
                }
                match self.report_rx.borrow().as_ref() {
                    None => HealthStatus::Healthy,
                    Some(report) if report.all_reads_failed() => HealthStatus::Unhealthy(format!(
                        "no node log could be read in cycle {}",
                        report.cycle
                    )),
                    Some(report) if report.has_errors() => HealthStatus::Degraded(format!(
                        "cycle {}: {} read failure(s), {} entry error(s)",
                        report.cycle, report.read_failures, report.entry_errors
                    )),
                    Some(_) => HealthStatus::Healthy,
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 상태 파이프라인 빌더
pub struct StatusPipelineBuilder {
    config: PipelineConfig,
    publisher: Option<Arc<dyn StatusPublisher>>,
}

impl StatusPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            publisher: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 발행기를 지정합니다. 지정하지 않으면 [`LogPublisher`]를 사용합니다.
    pub fn publisher(mut self, publisher: Arc<dyn StatusPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<StatusPipeline, LogPipelineError> {
        self.config.validate()?;

        let publisher = self
            .publisher
            .unwrap_or_else(|| Arc::new(LogPublisher));
        let poller = StatusPoller::new(&self.config, publisher);
        let (report_tx, report_rx) = watch::channel(None);

        Ok(StatusPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            poller: Some(poller),
            task: None,
            cancel: CancellationToken::new(),
            report_tx,
            report_rx,
        })
    }
}

impl Default for StatusPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;

    fn config(dir: &std::path::Path, ids: &[&str]) -> PipelineConfig {
        PipelineConfigBuilder::new()
            .node_ids(ids.iter().copied())
            .log_dir(dir)
            .poll_interval_secs(3600)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_creates_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = StatusPipelineBuilder::new()
            .config(config(dir.path(), &["1-1"]))
            .build()
            .unwrap();
        assert_eq!(pipeline.state_name(), "initialized");
        assert!(pipeline.last_report().is_none());
    }

    #[test]
    fn builder_with_invalid_config_fails() {
        let result = StatusPipelineBuilder::new().build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn pipeline_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("1-1-out.log"),
            "INFO [2024-01-01T10:00:00:000] (a): NAT type: Open\n",
        )
        .unwrap();
        let mut pipeline = StatusPipelineBuilder::new()
            .config(config(dir.path(), &["1-1"]))
            .build()
            .unwrap();

        assert!(pipeline.health_check().await.is_unhealthy());
        assert!(pipeline.stop().await.is_err());

        pipeline.start().await.unwrap();
        assert_eq!(pipeline.state_name(), "running");
        assert!(pipeline.start().await.is_err());

        let mut reports = pipeline.subscribe_reports();
        reports.wait_for(Option::is_some).await.unwrap();
        assert!(pipeline.health_check().await.is_healthy());

        pipeline.stop().await.unwrap();
        assert_eq!(pipeline.state_name(), "stopped");
        assert!(pipeline.health_check().await.is_unhealthy());

        // 정지 후 재시작 가능
        pipeline.start().await.unwrap();
        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn health_reflects_read_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1-1-out.log"), "INFO [x] (a): NAT type: Open\n").unwrap();

        let mut pipeline = StatusPipelineBuilder::new()
            .config(config(dir.path(), &["1-1", "1-2"]))
            .build()
            .unwrap();
        pipeline.start().await.unwrap();
        pipeline
            .subscribe_reports()
            .wait_for(Option::is_some)
            .await
            .unwrap();
        assert!(matches!(
            pipeline.health_check().await,
            HealthStatus::Degraded(_)
        ));
        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn health_unhealthy_when_every_read_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = StatusPipelineBuilder::new()
            .config(config(dir.path(), &["1-1"]))
            .build()
            .unwrap();
        pipeline.start().await.unwrap();
        pipeline
            .subscribe_reports()
            .wait_for(Option::is_some)
            .await
            .unwrap();
        assert!(pipeline.health_check().await.is_unhealthy());
        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn run_once_returns_report_and_refuses_while_running() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1-1-out.log"), "INFO [x] (a): NAT type: Open\n").unwrap();
        let mut pipeline = StatusPipelineBuilder::new()
            .config(config(dir.path(), &["1-1"]))
            .build()
            .unwrap();

        let report = pipeline.run_once().await.unwrap();
        assert_eq!(report.cycle, 1);
        assert_eq!(report.dispatched, 1);
        assert_eq!(pipeline.last_report(), Some(report));

        pipeline.start().await.unwrap();
        assert!(pipeline.run_once().await.is_err());
        pipeline.stop().await.unwrap();
    }
}
