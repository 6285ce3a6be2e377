//! 엔트리 분류기
//!
//! 정제된 로그 라인 하나를 처리하는 순서:
//!
//! 1. 타임스탬프/메시지 분리 ([`split_entry`])
//! 2. 타임스탬프 파싱 (실패 시 현재 시각) → `updatedAt` 덮어쓰기
//! 3. 스킵 필터에 걸리면 종료
//! 4. 첫 번째로 일치하는 [`FieldRule`] 적용

use chrono::{DateTime, Utc};
use streamr_monitor_core::types::NodeStatus;

use crate::error::LogPipelineError;
use crate::parser::{parse_timestamp, split_entry};
use crate::rule::{FieldRule, SkipFilter};
use crate::store::NodeStateStore;

/// 엔트리 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// 스킵 목록에 걸림 (`updatedAt`만 갱신)
    Skipped,
    /// 규칙이 적용됨
    Matched(FieldRule),
    /// 일치하는 규칙 없음 (`updatedAt`만 갱신)
    Unmatched,
}

/// 엔트리 분류기
#[derive(Debug, Clone, Default)]
pub struct EntryClassifier {
    skip: SkipFilter,
}

impl EntryClassifier {
    /// 기본 스킵 목록을 사용하는 분류기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 주어진 스킵 필터를 사용하는 분류기를 생성합니다.
    pub fn with_skip_filter(skip: SkipFilter) -> Self {
        Self { skip }
    }

    /// 저장소에서 노드 레코드를 찾아 엔트리를 적용합니다.
    pub fn process_entry(
        &self,
        raw_entry: &str,
        node_id: &str,
        store: &mut NodeStateStore,
    ) -> Result<EntryOutcome, LogPipelineError> {
        let status = store
            .get_mut(node_id)
            .ok_or_else(|| LogPipelineError::UnknownNode(node_id.to_owned()))?;
        self.apply(raw_entry, status)
    }

    /// 현재 시각을 대체 타임스탬프로 사용하여 엔트리를 적용합니다.
    pub fn apply(
        &self,
        raw_entry: &str,
        status: &mut NodeStatus,
    ) -> Result<EntryOutcome, LogPipelineError> {
        self.apply_at(raw_entry, status, Utc::now())
    }

    /// 엔트리를 적용합니다. 타임스탬프 파싱 실패 시 `now`를 사용합니다.
    ///
    /// 추출 에러가 나도 `updatedAt`은 이미 갱신된 상태입니다.
    pub fn apply_at(
        &self,
        raw_entry: &str,
        status: &mut NodeStatus,
        now: DateTime<Utc>,
    ) -> Result<EntryOutcome, LogPipelineError> {
        let parts = split_entry(raw_entry);
        let timestamp = parse_timestamp(parts.timestamp, now);
        status.updated_at = Some(timestamp);

        if self.skip.should_skip(parts.message) {
            return Ok(EntryOutcome::Skipped);
        }

        match FieldRule::classify(parts.message) {
            Some((rule, remainder)) => {
                rule.apply(remainder, timestamp, status)?;
                Ok(EntryOutcome::Matched(rule))
            }
            None => Ok(EntryOutcome::Unmatched),
        }
    }
}
