#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, MonitorError, ParseError, PipelineError, PublishError};

// 설정
pub use config::MonitorConfig;

// 파이프라인 trait
pub use pipeline::{BoxFuture, HealthStatus, Pipeline, StatusPublisher};

// 도메인 타입
pub use types::{NodeStatus, RewardStatus, ServerStatus};
