//! 파이프라인 trait — 모듈 생명주기와 상태 발행 확장 포인트 정의

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::MonitorError;
use crate::types::NodeStatus;

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 모듈 건강 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작 중이나 일부 문제 있음
    Degraded(String),
    /// 비정상
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 모든 장기 실행 모듈이 구현하는 생명주기 trait
///
/// 데몬은 이 trait을 통해 모듈을 시작/정지하고 건강 상태를 조회합니다.
pub trait Pipeline: Send {
    /// 모듈을 시작합니다. 이미 실행 중이면 에러를 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), MonitorError>> + Send;

    /// 모듈을 정지합니다. 실행 중이 아니면 에러를 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), MonitorError>> + Send;

    /// 모듈의 건강 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// 노드 상태 발행 trait
///
/// 사이클이 끝난 노드의 최종 상태를 외부로 내보냅니다.
/// `Arc<dyn StatusPublisher>`로 공유되므로 `BoxFuture`를 반환합니다.
pub trait StatusPublisher: Send + Sync {
    /// 발행기 이름 (로깅용)
    fn name(&self) -> &str;

    /// 노드 상태를 발행합니다.
    fn publish<'a>(
        &'a self,
        node_id: &'a str,
        status: &'a NodeStatus,
    ) -> BoxFuture<'a, Result<(), MonitorError>>;
}
