//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`MonitorConfig`](streamr_monitor_core::config::MonitorConfig)
//! 중 `[nodes]` 섹션을 기반으로 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use streamr_monitor_core::config::MonitorConfig;
//! use streamr_monitor_log_pipeline::config::PipelineConfig;
//!
//! let core_config = MonitorConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use streamr_monitor_core::config::{MonitorConfig, expand_home};

use crate::error::LogPipelineError;

/// 주기 / 타임아웃 상한 (초)
const MAX_INTERVAL_SECS: u64 = 86_400;

/// 로그 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 모니터링 대상 노드 ID (설정 순서 유지)
    pub node_ids: Vec<String>,
    /// 로그 디렉토리 (`~` 확장 완료)
    pub log_dir: PathBuf,
    /// 로그 파일 접미사
    pub log_file_suffix: String,
    /// 폴링 주기 (초)
    pub poll_interval_secs: u64,
    /// 로그 파일 하나를 읽는 최대 시간 (초)
    pub read_timeout_secs: u64,
    /// 기본 스킵 목록에 추가할 접두어
    pub extra_skip_prefixes: Vec<String>,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 정지 시 진행 중인 발행을 기다리는 최대 시간 (초)
    pub publish_drain_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            node_ids: Vec::new(),
            log_dir: expand_home("~/.pm2/logs"),
            log_file_suffix: "-out.log".to_owned(),
            poll_interval_secs: 60,
            read_timeout_secs: 10,
            extra_skip_prefixes: Vec::new(),
            publish_drain_timeout_secs: 10,
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &MonitorConfig) -> Self {
        let nodes = &core.nodes;
        Self {
            node_ids: nodes.ids.clone(),
            log_dir: expand_home(&nodes.log_dir),
            log_file_suffix: nodes.log_file_suffix.clone(),
            poll_interval_secs: nodes.poll_interval_secs,
            read_timeout_secs: nodes.read_timeout_secs,
            extra_skip_prefixes: nodes.extra_skip_prefixes.clone(),
            ..Self::default()
        }
    }

    /// 노드 ID가 로그 디렉토리 밖을 가리키지 않는지 검증합니다.
    fn validate_node_id(node_id: &str) -> Result<(), LogPipelineError> {
        if node_id.trim().is_empty() {
            return Err(LogPipelineError::Config {
                field: "node_ids".to_owned(),
                reason: "node id must not be empty".to_owned(),
            });
        }

        let as_path = Path::new(node_id);
        let single_normal_component = {
            let mut components = as_path.components();
            matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
        };
        if !single_normal_component || node_id.contains("..") {
            return Err(LogPipelineError::Config {
                field: "node_ids".to_owned(),
                reason: format!(
                    "node id '{node_id}' must not contain path separators or '..'"
                ),
            });
        }

        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.node_ids.is_empty() {
            return Err(LogPipelineError::Config {
                field: "node_ids".to_owned(),
                reason: "at least one node must be configured".to_owned(),
            });
        }

        for id in &self.node_ids {
            Self::validate_node_id(id)?;
        }

        if self.poll_interval_secs == 0 || self.poll_interval_secs > MAX_INTERVAL_SECS {
            return Err(LogPipelineError::Config {
                field: "poll_interval_secs".to_owned(),
                reason: format!("must be 1-{MAX_INTERVAL_SECS}"),
            });
        }

        if self.read_timeout_secs == 0 || self.read_timeout_secs > MAX_INTERVAL_SECS {
            return Err(LogPipelineError::Config {
                field: "read_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_INTERVAL_SECS}"),
            });
        }

        if self.publish_drain_timeout_secs > MAX_INTERVAL_SECS {
            return Err(LogPipelineError::Config {
                field: "publish_drain_timeout_secs".to_owned(),
                reason: format!("must be 0-{MAX_INTERVAL_SECS}"),
            });
        }

        if self.extra_skip_prefixes.iter().any(String::is_empty) {
            return Err(LogPipelineError::Config {
                field: "extra_skip_prefixes".to_owned(),
                reason: "an empty prefix would skip every line".to_owned(),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 노드 ID 목록을 설정합니다.
    pub fn node_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.node_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// 로그 디렉토리를 설정합니다.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    /// 로그 파일 접미사를 설정합니다.
    pub fn log_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.log_file_suffix = suffix.into();
        self
    }

    /// 폴링 주기(초)를 설정합니다.
    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_secs = secs;
        self
    }

    /// 파일 읽기 타임아웃(초)을 설정합니다.
    pub fn read_timeout_secs(mut self, secs: u64) -> Self {
        self.config.read_timeout_secs = secs;
        self
    }

    /// 추가 스킵 접두어를 설정합니다.
    pub fn extra_skip_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.config.extra_skip_prefixes = prefixes;
        self
    }

    /// 발행 drain 타임아웃(초)을 설정합니다.
    pub fn publish_drain_timeout_secs(mut self, secs: u64) -> Self {
        self.config.publish_drain_timeout_secs = secs;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_requires_nodes() {
        let err = PipelineConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("node_ids"));
    }

    #[test]
    fn from_core_preserves_values() {
        let mut core = MonitorConfig::default();
        core.nodes.ids = vec!["1-1".to_owned(), "1-2".to_owned()];
        core.nodes.log_dir = "/srv/pm2/logs".to_owned();
        core.nodes.poll_interval_secs = 30;

        let config = PipelineConfig::from_core(&core);
        assert_eq!(config.node_ids, vec!["1-1", "1-2"]);
        assert_eq!(config.log_dir, PathBuf::from("/srv/pm2/logs"));
        assert_eq!(config.poll_interval_secs, 30);
        // 확장 필드는 기본값
        assert_eq!(config.publish_drain_timeout_secs, 10);
        config.validate().unwrap();
    }

    #[test]
    fn from_core_expands_home() {
        let config = PipelineConfig::from_core(&MonitorConfig::default());
        assert!(!config.log_dir.to_string_lossy().starts_with('~'));
        assert!(config.log_dir.ends_with(".pm2/logs"));
    }

    #[test]
    fn builder_sets_fields() {
        let config = PipelineConfigBuilder::new()
            .node_ids(["2-3"])
            .log_dir("/var/log/pm2")
            .log_file_suffix("-error.log")
            .publish_drain_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/var/log/pm2"));
        assert_eq!(config.log_file_suffix, "-error.log");
        assert_eq!(config.publish_drain_timeout_secs, 0);
    }

    #[test]
    fn validate_rejects_traversal_node_ids() {
        for bad in ["../secret", "a/b", "..", "/abs", " "] {
            let result = PipelineConfigBuilder::new().node_ids([bad]).build();
            assert!(result.is_err(), "node id {bad:?} should be rejected");
        }
    }

    #[test]
    fn validate_rejects_zero_intervals() {
        let result = PipelineConfigBuilder::new()
            .node_ids(["1-1"])
            .poll_interval_secs(0)
            .build();
        assert!(result.is_err());

        let result = PipelineConfigBuilder::new()
            .node_ids(["1-1"])
            .read_timeout_secs(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_empty_skip_prefix() {
        let result = PipelineConfigBuilder::new()
            .node_ids(["1-1"])
            .extra_skip_prefixes(vec![String::new()])
            .build();
        assert!(result.is_err());
    }
}
