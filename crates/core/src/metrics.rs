//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `streamr_monitor_`
//! - 영역: `log_`, `poll_`, `publish_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(streamr_monitor_core::metrics::LOG_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 노드 레이블 키
pub const LABEL_NODE: &str = "node";

/// 상태 필드 레이블 키 (ethereum_address, peers, ...)
pub const LABEL_FIELD: &str = "field";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── 로그 처리 메트릭 ──────────────────────────────────────────────

/// 읽은 로그 라인 수 (counter, label: node)
pub const LOG_LINES_READ_TOTAL: &str = "streamr_monitor_log_lines_read_total";

/// 스킵 목록에 걸린 라인 수 (counter)
pub const LOG_LINES_SKIPPED_TOTAL: &str = "streamr_monitor_log_lines_skipped_total";

/// 필드 규칙에 매칭된 라인 수 (counter, label: field)
pub const LOG_LINES_MATCHED_TOTAL: &str = "streamr_monitor_log_lines_matched_total";

/// 필드 추출 실패 수 (counter, label: field)
pub const LOG_EXTRACT_ERRORS_TOTAL: &str = "streamr_monitor_log_extract_errors_total";

/// 로그 파일 읽기 실패 수 (counter, label: node)
pub const LOG_READ_ERRORS_TOTAL: &str = "streamr_monitor_log_read_errors_total";

// ─── 폴링 메트릭 ───────────────────────────────────────────────────

/// 완료된 폴링 사이클 수 (counter)
pub const POLL_CYCLES_TOTAL: &str = "streamr_monitor_poll_cycles_total";

/// 폴링 사이클 소요 시간 (histogram, 초)
pub const POLL_CYCLE_DURATION_SECONDS: &str = "streamr_monitor_poll_cycle_duration_seconds";

/// 모니터링 대상 노드 수 (gauge)
pub const POLL_NODES_CONFIGURED: &str = "streamr_monitor_poll_nodes_configured";

// ─── 발행 메트릭 ───────────────────────────────────────────────────

/// 상태 발행 시도 수 (counter, label: result)
pub const PUBLISH_TOTAL: &str = "streamr_monitor_publish_total";

/// 상태 발행 소요 시간 (histogram, 초)
pub const PUBLISH_DURATION_SECONDS: &str = "streamr_monitor_publish_duration_seconds";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "streamr_monitor_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "streamr_monitor_daemon_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 폴링 사이클 / 발행 소요 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 60s 범위 (파일 읽기와 HTTP 왕복 포함)
pub const CYCLE_DURATION_BUCKETS: [f64; 10] =
    [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 60.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // 로그 처리
    describe_counter!(LOG_LINES_READ_TOTAL, "Total number of log lines read");
    describe_counter!(
        LOG_LINES_SKIPPED_TOTAL,
        "Total number of log lines dropped by the skip list"
    );
    describe_counter!(
        LOG_LINES_MATCHED_TOTAL,
        "Total number of log lines that updated a status field"
    );
    describe_counter!(
        LOG_EXTRACT_ERRORS_TOTAL,
        "Total number of matched lines whose value could not be extracted"
    );
    describe_counter!(
        LOG_READ_ERRORS_TOTAL,
        "Total number of failed log file reads"
    );

    // 폴링
    describe_counter!(POLL_CYCLES_TOTAL, "Total number of completed poll cycles");
    describe_histogram!(
        POLL_CYCLE_DURATION_SECONDS,
        "Time to read and classify all node logs in seconds"
    );
    describe_gauge!(POLL_NODES_CONFIGURED, "Number of monitored nodes");

    // 발행
    describe_counter!(PUBLISH_TOTAL, "Total number of status publish attempts");
    describe_histogram!(
        PUBLISH_DURATION_SECONDS,
        "Time to publish a single node status in seconds"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Daemon uptime in seconds");
    describe_gauge!(DAEMON_BUILD_INFO, "Build information (always 1)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_share_prefix() {
        let names = [
            LOG_LINES_READ_TOTAL,
            LOG_LINES_SKIPPED_TOTAL,
            LOG_LINES_MATCHED_TOTAL,
            LOG_EXTRACT_ERRORS_TOTAL,
            LOG_READ_ERRORS_TOTAL,
            POLL_CYCLES_TOTAL,
            POLL_CYCLE_DURATION_SECONDS,
            POLL_NODES_CONFIGURED,
            PUBLISH_TOTAL,
            PUBLISH_DURATION_SECONDS,
            DAEMON_UPTIME_SECONDS,
            DAEMON_BUILD_INFO,
        ];
        for name in &names {
            assert!(
                name.starts_with("streamr_monitor_"),
                "metric '{name}' should start with streamr_monitor_"
            );
        }
    }

    #[test]
    fn buckets_are_sorted() {
        assert!(CYCLE_DURATION_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn describe_all_does_not_panic() {
        describe_all();
    }
}
