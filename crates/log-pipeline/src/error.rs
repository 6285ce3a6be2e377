//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for MonitorError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use streamr_monitor_core::error::{ConfigError, MonitorError, ParseError, PipelineError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 매칭된 라인에서 값 추출 실패 (예: Plugins JSON)
    #[error("parse error: {field}: {reason}")]
    Parse {
        /// 대상 상태 필드
        field: String,
        /// 실패 사유
        reason: String,
    },

    /// 상태 저장소에 없는 노드
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// 로그 파일 읽기 실패
    #[error("collector error: {path}: {reason}")]
    Collector {
        /// 로그 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 로그 파일 읽기 시간 초과
    #[error("read timed out after {timeout_secs}s: {path}")]
    ReadTimeout {
        /// 로그 파일 경로
        path: String,
        /// 적용된 타임아웃 (초)
        timeout_secs: u64,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<LogPipelineError> for MonitorError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Parse { field, reason } => {
                MonitorError::Parse(ParseError::Field { field, reason })
            }
            LogPipelineError::UnknownNode(id) => MonitorError::Parse(ParseError::UnknownNode(id)),
            LogPipelineError::Config { field, reason } => {
                MonitorError::Config(ConfigError::InvalidValue { field, reason })
            }
            other => MonitorError::Pipeline(PipelineError::TaskFailed(other.to_string())),
        }
    }
}
