//! streamr-monitor.toml 통합 설정 테스트
//!
//! - streamr-monitor.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 / 레거시 변수 우선순위 테스트
//! - 파일 로딩 (존재/부재) 테스트

use std::io::Write;

use streamr_monitor_core::config::MonitorConfig;
use streamr_monitor_core::error::{ConfigError, MonitorError};

const EXAMPLE: &str = include_str!("../../../streamr-monitor.toml.example");

/// 테스트 동안 환경변수를 설정하고 원래 값을 복원합니다.
fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let originals: Vec<_> = vars
        .iter()
        .map(|(k, _)| (*k, std::env::var(k).ok()))
        .collect();
    // SAFETY: 호출하는 테스트는 모두 #[serial]로 직렬화됩니다.
    unsafe {
        for (k, v) in vars {
            std::env::set_var(k, v);
        }
    }
    let result = f();
    // SAFETY: 테스트 정리
    unsafe {
        for (k, original) in originals {
            match original {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }
    }
    result
}

// =============================================================================
// streamr-monitor.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = MonitorConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.nodes.ids, vec!["1-1", "1-2"]);
    assert_eq!(config.nodes.log_dir, "~/.pm2/logs");
    assert_eq!(config.publisher.port, Some(7171));
}

#[test]
fn example_config_passes_validation() {
    let config = MonitorConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let example = MonitorConfig::parse(EXAMPLE).expect("should parse");
    let defaults = MonitorConfig::default();

    assert_eq!(example.nodes.log_file_suffix, defaults.nodes.log_file_suffix);
    assert_eq!(
        example.nodes.poll_interval_secs,
        defaults.nodes.poll_interval_secs
    );
    assert_eq!(
        example.nodes.read_timeout_secs,
        defaults.nodes.read_timeout_secs
    );
    assert_eq!(example.publisher.endpoint, defaults.publisher.endpoint);
    assert_eq!(example.publisher.timeout_secs, defaults.publisher.timeout_secs);
    assert_eq!(example.provisioning.env_file, defaults.provisioning.env_file);
    assert_eq!(example.metrics.port, defaults.metrics.port);
    assert_eq!(example.metrics.enabled, defaults.metrics.enabled);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_nodes_only() {
    let config = MonitorConfig::parse(
        r#"
[nodes]
ids = ["3-1"]
poll_interval_secs = 30
"#,
    )
    .expect("should parse");

    assert_eq!(config.nodes.ids, vec!["3-1"]);
    assert_eq!(config.nodes.poll_interval_secs, 30);
    assert_eq!(config.nodes.log_file_suffix, "-out.log");
    assert_eq!(config.general.log_level, "info");
    assert!(config.publisher.enabled);
}

#[test]
fn empty_string_parses_with_defaults() {
    let config = MonitorConfig::parse("").expect("empty string should parse");
    assert!(config.nodes.ids.is_empty());
    config.validate().expect("defaults should validate");
}

#[test]
fn invalid_type_returns_parse_error() {
    let err = MonitorConfig::parse("[nodes]\npoll_interval_secs = \"sixty\"").unwrap_err();
    assert!(matches!(
        err,
        MonitorError::Config(ConfigError::ParseFailed { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn legacy_env_overrides_toml() {
    let mut config = MonitorConfig::parse(EXAMPLE).expect("should parse");
    with_env(
        &[
            ("PM2_NAMES", "9-1,9-2,9-3"),
            ("PM2_LOG_DIRECTORY", "/srv/pm2/logs"),
            ("BROKER_NODE_URL", "http://10.0.0.5"),
        ],
        || config.apply_env_overrides(),
    );

    assert_eq!(config.nodes.ids, vec!["9-1", "9-2", "9-3"]);
    assert_eq!(config.nodes.log_dir, "/srv/pm2/logs");
    assert_eq!(config.publisher.endpoint, "http://10.0.0.5");
    // 설정되지 않은 값은 TOML 값 유지
    assert_eq!(config.publisher.port, Some(7171));
}

#[test]
#[serial_test::serial]
fn prefixed_env_overrides_legacy() {
    let mut config = MonitorConfig::default();
    with_env(
        &[
            ("STREAM_ID", "legacy/stream"),
            ("STREAMR_MONITOR_PUBLISHER_STREAM_ID", "prefixed/stream"),
            ("STREAMR_MONITOR_NODES_POLL_INTERVAL_SECS", "15"),
        ],
        || config.apply_env_overrides(),
    );

    assert_eq!(config.publisher.stream_id, "prefixed/stream");
    assert_eq!(config.nodes.poll_interval_secs, 15);
}

#[test]
#[serial_test::serial]
fn invalid_numeric_env_keeps_toml_value() {
    let mut config = MonitorConfig::parse(EXAMPLE).expect("should parse");
    with_env(&[("BROKER_NODE_PORT", "not-a-port")], || {
        config.apply_env_overrides()
    });
    assert_eq!(config.publisher.port, Some(7171));
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
#[serial_test::serial]
async fn load_reads_file_and_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(EXAMPLE.as_bytes()).expect("write");

    let config = MonitorConfig::load(file.path()).await.expect("should load");
    assert!(config.has_nodes());
}

#[tokio::test]
#[serial_test::serial]
async fn load_missing_file_is_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = MonitorConfig::load(dir.path().join("missing.toml"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MonitorError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
#[serial_test::serial]
async fn load_or_default_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = MonitorConfig::load_or_default(dir.path().join("missing.toml"))
        .await
        .expect("missing file should fall back to defaults");
    assert_eq!(config.nodes.poll_interval_secs, 60);
}

#[tokio::test]
#[serial_test::serial]
async fn load_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(b"[general]\nlog_level = \"verbose\"\n")
        .expect("write");

    let err = MonitorConfig::load(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("log_level"));
}
