//! 설정 관리 — streamr-monitor.toml 파싱 및 런타임 설정
//!
//! [`MonitorConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, 데몬에서 적용)
//! 2. 환경변수 (`STREAMR_MONITOR_NODES_IDS=1-1,1-2` 형식)
//! 3. 레거시 `.env` 변수 (`PM2_NAMES`, `PM2_LOG_DIRECTORY`, `BROKER_NODE_URL`,
//!    `BROKER_NODE_PORT`, `STREAM_ID`, `BROKER_NODE_API_KEY`)
//! 4. 설정 파일 (`streamr-monitor.toml`)
//! 5. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), streamr_monitor_core::error::MonitorError> {
//! use streamr_monitor_core::config::MonitorConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = MonitorConfig::load("streamr-monitor.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = MonitorConfig::parse("[nodes]\nids = [\"1-1\"]")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, MonitorError};

/// 폴링 주기 / 타임아웃 상한 (초)
const MAX_INTERVAL_SECS: u64 = 86_400;

/// streamr-monitor 통합 설정
///
/// `streamr-monitor.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 모니터링 대상 노드 설정
    #[serde(default)]
    pub nodes: NodesConfig,
    /// 상태 발행 설정
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// 초기화/노드 프로비저닝 설정
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl MonitorConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 파일이 없으면 에러를 반환합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에서 시작하는 것을 제외하고 [`load`](Self::load)와 동일합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(MonitorError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MonitorError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                MonitorError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, MonitorError> {
        toml::from_str(toml_str).map_err(|e| {
            MonitorError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 레거시 `.env` 변수를 먼저 적용한 뒤
    /// `STREAMR_MONITOR_{SECTION}_{FIELD}` 변수를 적용합니다.
    pub fn apply_env_overrides(&mut self) {
        self.apply_legacy_env_overrides();

        // General
        override_string(&mut self.general.log_level, "STREAMR_MONITOR_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "STREAMR_MONITOR_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "STREAMR_MONITOR_GENERAL_PID_FILE");

        // Nodes
        override_csv(&mut self.nodes.ids, "STREAMR_MONITOR_NODES_IDS");
        override_string(&mut self.nodes.log_dir, "STREAMR_MONITOR_NODES_LOG_DIR");
        override_string(
            &mut self.nodes.log_file_suffix,
            "STREAMR_MONITOR_NODES_LOG_FILE_SUFFIX",
        );
        override_u64(
            &mut self.nodes.poll_interval_secs,
            "STREAMR_MONITOR_NODES_POLL_INTERVAL_SECS",
        );
        override_u64(
            &mut self.nodes.read_timeout_secs,
            "STREAMR_MONITOR_NODES_READ_TIMEOUT_SECS",
        );
        override_csv(
            &mut self.nodes.extra_skip_prefixes,
            "STREAMR_MONITOR_NODES_EXTRA_SKIP_PREFIXES",
        );

        // Publisher
        override_bool(&mut self.publisher.enabled, "STREAMR_MONITOR_PUBLISHER_ENABLED");
        override_string(&mut self.publisher.endpoint, "STREAMR_MONITOR_PUBLISHER_ENDPOINT");
        override_opt_u16(&mut self.publisher.port, "STREAMR_MONITOR_PUBLISHER_PORT");
        override_string(&mut self.publisher.stream_id, "STREAMR_MONITOR_PUBLISHER_STREAM_ID");
        override_string(&mut self.publisher.api_key, "STREAMR_MONITOR_PUBLISHER_API_KEY");
        override_u64(
            &mut self.publisher.timeout_secs,
            "STREAMR_MONITOR_PUBLISHER_TIMEOUT_SECS",
        );

        // Provisioning
        override_string(
            &mut self.provisioning.env_file,
            "STREAMR_MONITOR_PROVISIONING_ENV_FILE",
        );
        override_string(
            &mut self.provisioning.streamr_config_dir,
            "STREAMR_MONITOR_PROVISIONING_STREAMR_CONFIG_DIR",
        );
        override_string(
            &mut self.provisioning.nodes_yml_template,
            "STREAMR_MONITOR_PROVISIONING_NODES_YML_TEMPLATE",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "STREAMR_MONITOR_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "STREAMR_MONITOR_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "STREAMR_MONITOR_METRICS_PORT");
    }

    /// pm2 배포에서 쓰던 `.env` 변수명을 적용합니다.
    fn apply_legacy_env_overrides(&mut self) {
        override_csv(&mut self.nodes.ids, "PM2_NAMES");
        override_string(&mut self.nodes.log_dir, "PM2_LOG_DIRECTORY");
        override_string(&mut self.publisher.endpoint, "BROKER_NODE_URL");
        override_opt_u16(&mut self.publisher.port, "BROKER_NODE_PORT");
        override_string(&mut self.publisher.stream_id, "STREAM_ID");
        override_string(&mut self.publisher.api_key, "BROKER_NODE_API_KEY");
    }

    /// 노드 목록이 설정되어 있는지 확인합니다.
    ///
    /// 비어 있으면 데몬은 폴링 대신 초기화(bootstrap)를 수행합니다.
    pub fn has_nodes(&self) -> bool {
        !self.nodes.ids.is_empty()
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), MonitorError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.nodes.poll_interval_secs == 0 || self.nodes.poll_interval_secs > MAX_INTERVAL_SECS
        {
            return Err(invalid(
                "nodes.poll_interval_secs",
                format!("must be 1-{MAX_INTERVAL_SECS}"),
            ));
        }

        if self.nodes.read_timeout_secs == 0 || self.nodes.read_timeout_secs > MAX_INTERVAL_SECS {
            return Err(invalid(
                "nodes.read_timeout_secs",
                format!("must be 1-{MAX_INTERVAL_SECS}"),
            ));
        }

        for id in &self.nodes.ids {
            validate_node_id(id)?;
        }

        if self.publisher.timeout_secs == 0 || self.publisher.timeout_secs > MAX_INTERVAL_SECS {
            return Err(invalid(
                "publisher.timeout_secs",
                format!("must be 1-{MAX_INTERVAL_SECS}"),
            ));
        }

        // 노드가 없으면 bootstrap 경로이므로 발행 설정은 검사하지 않음
        if self.has_nodes() && self.publisher.enabled {
            if self.publisher.endpoint.trim().is_empty() {
                return Err(invalid(
                    "publisher.endpoint",
                    "must not be empty when publishing is enabled".to_owned(),
                ));
            }
            if self.publisher.stream_id.trim().is_empty() {
                return Err(invalid(
                    "publisher.stream_id",
                    "must not be empty when publishing is enabled".to_owned(),
                ));
            }
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must not be 0".to_owned()));
        }

        Ok(())
    }
}

/// 노드 ID는 로그 파일 경로에 그대로 쓰이므로 경로 구분자를 허용하지 않습니다.
fn validate_node_id(id: &str) -> Result<(), MonitorError> {
    if id.trim().is_empty() {
        return Err(invalid("nodes.ids", "node id must not be empty".to_owned()));
    }
    if id.contains('/') || id.contains('\\') || id.contains("..") {
        return Err(invalid(
            "nodes.ids",
            format!("node id '{id}' must not contain path separators or '..'"),
        ));
    }
    Ok(())
}

fn invalid(field: &str, reason: String) -> MonitorError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// `~/`로 시작하는 경로를 홈 디렉토리 기준으로 확장합니다.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => PathBuf::from(path),
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 사용 안 함)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// 모니터링 대상 노드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodesConfig {
    /// 노드 식별자 목록 (pm2 프로세스 이름)
    pub ids: Vec<String>,
    /// pm2 로그 디렉토리
    pub log_dir: String,
    /// 로그 파일 접미사 (`{log_dir}/{id}{suffix}`)
    pub log_file_suffix: String,
    /// 폴링 주기 (초)
    pub poll_interval_secs: u64,
    /// 로그 파일 하나를 읽는 최대 시간 (초)
    pub read_timeout_secs: u64,
    /// 기본 목록에 추가로 건너뛸 메시지 접두어
    pub extra_skip_prefixes: Vec<String>,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            log_dir: "~/.pm2/logs".to_owned(),
            log_file_suffix: "-out.log".to_owned(),
            poll_interval_secs: 60,
            read_timeout_secs: 10,
            extra_skip_prefixes: Vec::new(),
        }
    }
}

/// 상태 발행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// 활성화 여부 (false면 로그로만 출력)
    pub enabled: bool,
    /// 브로커 노드 URL (스킴 포함)
    pub endpoint: String,
    /// 브로커 노드 포트 (None이면 endpoint 그대로 사용)
    pub port: Option<u16>,
    /// 발행 대상 스트림 ID
    pub stream_id: String,
    /// Bearer 인증 키
    pub api_key: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost".to_owned(),
            port: None,
            stream_id: String::new(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

/// 초기화/노드 프로비저닝 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// 모니터 `.env` 파일 경로
    pub env_file: String,
    /// Streamr 브로커 설정 디렉토리
    pub streamr_config_dir: String,
    /// 초기화 시 복사할 pm2 `nodes.yml` 템플릿 경로
    pub nodes_yml_template: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            env_file: "~/.streamr-monitor/config/.env".to_owned(),
            streamr_config_dir: "~/.streamr/config".to_owned(),
            nodes_yml_template: "nodes.yml".to_owned(),
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_opt_u16(target: &mut Option<u16>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        if val.trim().is_empty() {
            *target = None;
            return;
        }
        match val.trim().parse::<u16>() {
            Ok(parsed) => *target = Some(parsed),
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse port from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
