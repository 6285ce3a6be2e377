//! 폴링 스케줄러
//!
//! 한 사이클의 흐름:
//!
//! ```text
//! reset store -> JoinSet 로 모든 노드 로그 동시 읽기
//!             -> 읽기가 끝나는 순서대로 분류 (이 태스크가 store의 유일한 writer)
//!             -> 노드별 최종 상태 복사본으로 발행 태스크 spawn (기다리지 않음)
//! ```
//!
//! 사이클은 겹치지 않습니다. [`StatusPoller::run`]은 사이클이 끝난 뒤에만 다음 tick을 기다리고,
//! 놓친 tick은 건너뜁니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use streamr_monitor_core::metrics as m;
use streamr_monitor_core::pipeline::StatusPublisher;
use streamr_monitor_core::types::NodeStatus;

use crate::classifier::{EntryClassifier, EntryOutcome};
use crate::collector::LogFileCollector;
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::rule::SkipFilter;
use crate::store::NodeStateStore;

/// 한 사이클의 결과 요약
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// 사이클 번호 (1부터)
    pub cycle: u64,
    /// 대상 노드 수
    pub nodes: usize,
    /// 로그 파일 읽기에 실패한 노드 수
    pub read_failures: usize,
    /// 처리한 라인 수
    pub lines: usize,
    /// 값 추출에 실패한 라인 수
    pub entry_errors: usize,
    /// 발행을 시작한 노드 수
    pub dispatched: usize,
    /// 읽기와 분류에 걸린 시간
    pub duration: Duration,
    /// 사이클 종료 시각
    pub finished_at: DateTime<Utc>,
}

impl CycleReport {
    /// 모든 노드의 읽기가 실패했는지 확인합니다.
    pub fn all_reads_failed(&self) -> bool {
        self.nodes > 0 && self.read_failures == self.nodes
    }

    /// 읽기 실패나 추출 에러가 있었는지 확인합니다.
    pub fn has_errors(&self) -> bool {
        self.read_failures > 0 || self.entry_errors > 0
    }
}

/// 폴링 스케줄러
///
/// 상태 저장소를 단독 소유하고 사이클 단위로 재구성합니다.
pub struct StatusPoller {
    node_ids: Vec<String>,
    store: NodeStateStore,
    classifier: EntryClassifier,
    collector: Arc<LogFileCollector>,
    publisher: Arc<dyn StatusPublisher>,
    /// 진행 중인 발행 태스크 (회수/drain 용도)
    publishes: JoinSet<()>,
    cycles: u64,
}

impl StatusPoller {
    /// 파이프라인 설정과 발행기로 폴러를 생성합니다.
    pub fn new(config: &PipelineConfig, publisher: Arc<dyn StatusPublisher>) -> Self {
        let skip = SkipFilter::with_extra_prefixes(config.extra_skip_prefixes.iter().cloned());
        let collector = LogFileCollector::from_config(config);
        debug!(
            log_dir = %collector.log_dir().display(),
            extra_skip_prefixes = skip.extra_count(),
            "status poller configured"
        );
        Self::with_parts(
            config.node_ids.clone(),
            EntryClassifier::with_skip_filter(skip),
            collector,
            publisher,
        )
    }

    /// 구성 요소를 직접 지정하여 폴러를 생성합니다.
    pub fn with_parts(
        node_ids: Vec<String>,
        classifier: EntryClassifier,
        collector: LogFileCollector,
        publisher: Arc<dyn StatusPublisher>,
    ) -> Self {
        gauge!(m::POLL_NODES_CONFIGURED).set(node_ids.len() as f64);
        Self {
            node_ids,
            store: NodeStateStore::new(),
            classifier,
            collector: Arc::new(collector),
            publisher,
            publishes: JoinSet::new(),
            cycles: 0,
        }
    }

    /// 상태 저장소 (마지막 사이클 결과)
    pub fn store(&self) -> &NodeStateStore {
        &self.store
    }

    /// 완료한 사이클 수
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// 아직 끝나지 않은 발행 태스크 수
    pub fn in_flight_publishes(&self) -> usize {
        self.publishes.len()
    }

    /// 사이클 하나를 실행합니다.
    ///
    /// 노드 하나의 실패는 다른 노드에 영향을 주지 않으며 사이클 자체는 실패하지 않습니다.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();
        self.reap_publishes();
        self.cycles += 1;

        self.store.reset(&self.node_ids);
        let mut report = CycleReport {
            cycle: self.cycles,
            nodes: self.store.len(),
            read_failures: 0,
            lines: 0,
            entry_errors: 0,
            dispatched: 0,
            duration: Duration::ZERO,
            finished_at: Utc::now(),
        };

        let mut reads = JoinSet::new();
        for node_id in self.store.node_ids() {
            let collector = Arc::clone(&self.collector);
            let node_id = node_id.clone();
            reads.spawn(async move {
                debug!(node = %node_id, "node run started");
                let lines = collector.read_lines(&node_id).await;
                (node_id, lines)
            });
        }

        while let Some(joined) = reads.join_next().await {
            match joined {
                Ok((node_id, Ok(lines))) => {
                    let (processed, errors) = self.classify_node(&node_id, &lines);
                    report.lines += processed;
                    report.entry_errors += errors;

                    if let Some(status) = self.store.snapshot(&node_id) {
                        self.dispatch_publish(node_id, status);
                        report.dispatched += 1;
                    }
                }
                Ok((node_id, Err(e))) => {
                    report.read_failures += 1;
                    counter!(m::LOG_READ_ERRORS_TOTAL, m::LABEL_NODE => node_id.clone())
                        .increment(1);
                    warn!(node = %node_id, error = %e, "failed to read node log, skipping publish");
                }
                Err(e) => {
                    report.read_failures += 1;
                    warn!(error = %e, "log read task failed");
                }
            }
        }

        report.duration = started.elapsed();
        report.finished_at = Utc::now();
        counter!(m::POLL_CYCLES_TOTAL).increment(1);
        histogram!(m::POLL_CYCLE_DURATION_SECONDS).record(report.duration.as_secs_f64());

        info!(
            cycle = report.cycle,
            nodes = report.nodes,
            lines = report.lines,
            read_failures = report.read_failures,
            entry_errors = report.entry_errors,
            duration_ms = report.duration.as_millis() as u64,
            "poll cycle complete"
        );

        report
    }

    /// 노드 하나의 라인을 파일 순서대로 분류합니다.
    ///
    /// `(처리한 라인 수, 추출 에러 수)`를 반환합니다.
    fn classify_node(&mut self, node_id: &str, lines: &[String]) -> (usize, usize) {
        let mut errors = 0;
        for line in lines {
            match self.classifier.process_entry(line, node_id, &mut self.store) {
                Ok(EntryOutcome::Matched(rule)) => {
                    counter!(m::LOG_LINES_MATCHED_TOTAL, m::LABEL_FIELD => rule.as_str())
                        .increment(1);
                }
                Ok(EntryOutcome::Skipped) => {
                    counter!(m::LOG_LINES_SKIPPED_TOTAL).increment(1);
                }
                Ok(EntryOutcome::Unmatched) => {}
                Err(e) => {
                    errors += 1;
                    let field = match &e {
                        LogPipelineError::Parse { field, .. } => field.clone(),
                        _ => "unknown".to_owned(),
                    };
                    counter!(m::LOG_EXTRACT_ERRORS_TOTAL, m::LABEL_FIELD => field).increment(1);
                    warn!(node = node_id, error = %e, "failed to apply log entry, keeping previous value");
                }
            }
        }
        counter!(m::LOG_LINES_READ_TOTAL, m::LABEL_NODE => node_id.to_owned())
            .increment(lines.len() as u64);
        (lines.len(), errors)
    }

    /// 발행 태스크를 spawn 합니다. 결과는 로그와 메트릭으로만 남깁니다.
    fn dispatch_publish(&mut self, node_id: String, status: NodeStatus) {
        let publisher = Arc::clone(&self.publisher);
        self.publishes.spawn(async move {
            let started = Instant::now();
            match publisher.publish(&node_id, &status).await {
                Ok(()) => {
                    counter!(m::PUBLISH_TOTAL, m::LABEL_RESULT => "success").increment(1);
                    debug!(node = %node_id, publisher = publisher.name(), "node run complete");
                }
                Err(e) => {
                    counter!(m::PUBLISH_TOTAL, m::LABEL_RESULT => "failure").increment(1);
                    warn!(
                        node = %node_id,
                        publisher = publisher.name(),
                        error = %e,
                        "failed to publish node status"
                    );
                }
            }
            histogram!(m::PUBLISH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        });
    }

    /// 끝난 발행 태스크를 회수합니다.
    fn reap_publishes(&mut self) {
        while let Some(result) = self.publishes.try_join_next() {
            if let Err(e) = result {
                warn!(error = %e, "publish task failed");
            }
        }
    }

    /// 진행 중인 발행이 끝날 때까지 최대 `timeout` 동안 기다립니다.
    ///
    /// 시간 안에 끝나지 않은 발행은 중단하고 `false`를 반환합니다.
    pub async fn drain_publishes(&mut self, timeout: Duration) -> bool {
        let publishes = &mut self.publishes;
        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = publishes.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "publish task failed");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                remaining = self.publishes.len(),
                "publish drain timed out, aborting remaining publishes"
            );
            self.publishes.abort_all();
            // 중단된 태스크 회수
            while self.publishes.join_next().await.is_some() {}
            return false;
        }
        true
    }

    /// 취소될 때까지 주기적으로 사이클을 실행합니다.
    ///
    /// 첫 사이클은 즉시 실행됩니다. 재시작할 수 있도록 폴러 자신을 반환합니다.
    pub async fn run(
        mut self,
        interval: Duration,
        cancel: CancellationToken,
        reports: watch::Sender<Option<CycleReport>>,
    ) -> Self {
        info!(
            nodes = self.node_ids.len(),
            interval_secs = interval.as_secs(),
            "status poller started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let report = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("poll cycle interrupted by shutdown");
                    break;
                }
                report = self.run_cycle() => report,
            };
            reports.send_replace(Some(report));
        }

        info!(cycles = self.cycles, "status poller stopped");
        self
    }
}
