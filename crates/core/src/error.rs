//! 에러 타입 — 도메인별 에러 정의

/// streamr-monitor 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 로그 라인 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 상태 발행 에러
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,

    /// 백그라운드 태스크 비정상 종료
    #[error("pipeline task failed: {0}")]
    TaskFailed(String),
}

/// 로그 라인 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 필드 추출 실패
    #[error("failed to extract '{field}': {reason}")]
    Field { field: String, reason: String },

    /// 알 수 없는 노드
    #[error("unknown node: {0}")]
    UnknownNode(String),
}

/// 상태 발행 에러
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// 엔드포인트 URL 구성 실패
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// 요청 전송 실패 (연결, 타임아웃 등)
    #[error("request failed: {0}")]
    Request(String),

    /// 2xx 이외의 응답
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// 페이로드 직렬화 실패
    #[error("failed to serialize payload: {0}")]
    Serialize(String),
}
