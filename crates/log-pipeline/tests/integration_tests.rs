//! 통합 테스트 -- 로그 파일부터 발행까지의 전체 흐름 검증

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use streamr_monitor_core::error::MonitorError;
use streamr_monitor_core::pipeline::{BoxFuture, HealthStatus, Pipeline, StatusPublisher};
use streamr_monitor_core::types::NodeStatus;
use streamr_monitor_log_pipeline::{
    PipelineConfig, PipelineConfigBuilder, PublishPayload, StatusPipelineBuilder,
};

/// 발행된 JSON 본문을 기록하는 발행기
#[derive(Default)]
struct CapturingPublisher {
    payloads: Mutex<Vec<serde_json::Value>>,
}

impl CapturingPublisher {
    fn payloads(&self) -> Vec<serde_json::Value> {
        self.payloads.lock().unwrap().clone()
    }
}

impl StatusPublisher for CapturingPublisher {
    fn name(&self) -> &str {
        "capturing"
    }

    fn publish<'a>(
        &'a self,
        node_id: &'a str,
        status: &'a NodeStatus,
    ) -> BoxFuture<'a, Result<(), MonitorError>> {
        Box::pin(async move {
            let value = serde_json::to_value(PublishPayload { status, node_id }).unwrap();
            self.payloads.lock().unwrap().push(value);
            Ok(())
        })
    }
}

fn pipeline_config(dir: &Path, ids: &[&str]) -> PipelineConfig {
    PipelineConfigBuilder::new()
        .node_ids(ids.iter().copied())
        .log_dir(dir)
        .poll_interval_secs(3600)
        .publish_drain_timeout_secs(5)
        .build()
        .unwrap()
}

const FULL_NODE_LOG: &str = concat!(
    "\u{1b}[32mINFO\u{1b}[39m [2024-01-01T10:00:00:000] (broker): Starting broker version v52.0.0\n",
    "INFO [2024-01-01T10:00:00:100] (broker): Ethereum address 0xAbC0000000000000000000000000000000000001\n",
    "INFO [2024-01-01T10:00:00:200] (broker): Welcome to the Streamr Network. Your node's generated name is Dark Pear Banana.\n",
    "INFO [2024-01-01T10:00:00:300] (httpServer): HTTP server listening on 7171\n",
    "INFO [2024-01-01T10:00:00:400] (websocket): Websocket server listening on port 7170\n",
    "INFO [2024-01-01T10:00:00:500] (broker): Plugins: {\"websocket\":{\"port\":7170}}\n",
    "INFO [2024-01-01T10:00:01:000] (NodeWrapper): Successfully connected to 2 peer(s) (0xAAA, 0xBBB), 1 tracker(s)\n",
    "INFO [2024-01-01T10:00:01:100] (TrackerConnector): Connected to tracker 0xTracker\n",
    "INFO [2024-01-01T10:00:01:200] (TrackerConnector): Connected to tracker 0xTracker\n",
    "INFO [2024-01-01T10:00:01:300] (NatDetector): NAT type: Port Restricted Cone\n",
    "\n",
    "INFO [2024-01-01T10:00:02:000] (BrubeckMinerPlugin): Reward code received: 0xcode\n",
    "INFO [2024-01-01T10:00:03:000] (BrubeckMinerPlugin): Reward claimed successfully, current stake 250 DATA\n",
    "INFO [2024-01-01T10:00:04:000] (NodeWrapper): Subscribed to stream 0xabc/foo\n",
);

/// 로그 파일 한 개가 발행 본문 한 개로 변환되는 전체 흐름
#[tokio::test]
async fn full_log_becomes_published_payload() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("1-1-out.log"), FULL_NODE_LOG).unwrap();

    let publisher = Arc::new(CapturingPublisher::default());
    let mut pipeline = StatusPipelineBuilder::new()
        .config(pipeline_config(dir.path(), &["1-1"]))
        .publisher(publisher.clone())
        .build()
        .unwrap();

    let report = pipeline.run_once().await.unwrap();
    assert_eq!(report.read_failures, 0);
    assert_eq!(report.entry_errors, 0);
    assert_eq!(report.lines, 13);

    let payloads = publisher.payloads();
    assert_eq!(payloads.len(), 1);
    let p = &payloads[0];
    assert_eq!(p["pm2Name"], "1-1");
    assert_eq!(p["version"], "v52.0.0");
    assert_eq!(p["ethereumAddress"], "0xAbC0000000000000000000000000000000000001");
    assert_eq!(p["name"], "Dark Pear Banana");
    assert_eq!(p["http"]["listening"], true);
    assert_eq!(p["http"]["port"], 7171);
    assert_eq!(p["websocket"]["port"], 7170);
    assert_eq!(p["mqtt"]["listening"], false);
    assert_eq!(p["peers"], serde_json::json!(["0xAAA", "0xBBB"]));
    assert_eq!(p["trackers"], serde_json::json!(["0xTracker"]));
    assert_eq!(p["nat"], "Port Restricted Cone");
    assert_eq!(p["plugins"]["websocket"]["port"], 7170);
    assert_eq!(p["stake"], 250);
    assert!(p["rewards"]["lastRewardCodeReceivedAt"].is_string());
    assert!(p["rewards"]["lastRewardCodeClaimedAt"].is_string());
    // 마지막 라인(스킵되지 않은 미분류 메시지)의 시각
    assert!(p["updatedAt"].as_str().unwrap().ends_with(".000Z"));
}

/// 로그가 없는 노드는 발행되지 않고 나머지 노드는 발행됨
#[tokio::test]
async fn missing_log_only_skips_that_node() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("1-2-out.log"),
        "INFO [2024-01-01T10:00:00:000] (a): NAT type: Open\n",
    )
    .unwrap();

    let publisher = Arc::new(CapturingPublisher::default());
    let mut pipeline = StatusPipelineBuilder::new()
        .config(pipeline_config(dir.path(), &["1-1", "1-2"]))
        .publisher(publisher.clone())
        .build()
        .unwrap();

    let report = pipeline.run_once().await.unwrap();
    assert_eq!(report.read_failures, 1);
    assert_eq!(report.dispatched, 1);

    let payloads = publisher.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["pm2Name"], "1-2");
}

/// 사이클 사이에 상태가 이어지지 않음
#[tokio::test]
async fn each_cycle_starts_from_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("1-1-out.log");
    std::fs::write(&log, "INFO [2024-01-01T10:00:00:000] (a): NAT type: Open\n").unwrap();

    let publisher = Arc::new(CapturingPublisher::default());
    let mut pipeline = StatusPipelineBuilder::new()
        .config(pipeline_config(dir.path(), &["1-1"]))
        .publisher(publisher.clone())
        .build()
        .unwrap();

    pipeline.run_once().await.unwrap();
    std::fs::write(&log, "INFO [2024-01-01T11:00:00:000] (a): Subscribed to stream x\n").unwrap();
    pipeline.run_once().await.unwrap();

    let payloads = publisher.payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[0]["nat"], "Open");
    assert!(payloads[1]["nat"].is_null());
}

/// 시작 -> 사이클 -> 정지 -> 재시작 생명주기
#[tokio::test]
async fn pipeline_lifecycle_with_publishing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("1-1-out.log"),
        "INFO [2024-01-01T10:00:00:000] (a): HTTP server listening on 7171\n",
    )
    .unwrap();

    let publisher = Arc::new(CapturingPublisher::default());
    let mut pipeline = StatusPipelineBuilder::new()
        .config(pipeline_config(dir.path(), &["1-1"]))
        .publisher(publisher.clone())
        .build()
        .unwrap();

    pipeline.start().await.unwrap();
    let mut reports = pipeline.subscribe_reports();
    tokio::time::timeout(Duration::from_secs(5), reports.wait_for(Option::is_some))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pipeline.health_check().await, HealthStatus::Healthy);

    pipeline.stop().await.unwrap();
    // 정지 시 진행 중인 발행은 drain 됨
    assert_eq!(publisher.payloads().len(), 1);

    pipeline.start().await.unwrap();
    tokio::time::timeout(
        Duration::from_secs(5),
        reports.wait_for(|r| r.as_ref().is_some_and(|r| r.cycle == 2)),
    )
    .await
    .unwrap()
    .unwrap();
    pipeline.stop().await.unwrap();
    assert_eq!(pipeline.last_report().map(|r| r.cycle), Some(2));
    assert_eq!(publisher.payloads().len(), 2);
}
