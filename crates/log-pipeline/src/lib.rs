#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: 노드별 pm2 로그 파일 읽기
//! - [`parser`]: 라인 정제, 타임스탬프/메시지 분해
//! - [`rule`]: 스킵 접두어와 필드 규칙 테이블, 값 추출
//! - [`classifier`]: 엔트리 하나를 분류하여 노드 상태에 적용
//! - [`store`]: 사이클 단위 노드 상태 저장소
//! - [`publisher`]: HTTP / 로그 발행기
//! - [`poller`]: 주기적 사이클 스케줄러
//! - [`pipeline`]: 전체 파이프라인 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! LogFileCollector -> sanitize -> split_entry -> SkipFilter / FieldRule -> NodeStateStore
//!        |                                                                      |
//!   {log_dir}/{id}-out.log                                       StatusPublisher (HTTP)
//! ```

pub mod classifier;
pub mod collector;
pub mod config;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod poller;
pub mod publisher;
pub mod rule;
pub mod store;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{StatusPipeline, StatusPipelineBuilder};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::{EntryParts, parse_timestamp, sanitize, split_entry};

// 규칙
pub use rule::{FieldRule, SkipFilter};

// 분류 / 저장소
pub use classifier::{EntryClassifier, EntryOutcome};
pub use store::NodeStateStore;

// 수집 / 발행 / 스케줄링
pub use collector::LogFileCollector;
pub use poller::{CycleReport, StatusPoller};
pub use publisher::{HttpPublisher, LogPublisher, PublishPayload, build_publisher};
