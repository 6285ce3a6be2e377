//! 엔트리 분해 -- 타임스탬프 / 메시지 분리
//!
//! `SEVERITY [timestamp] (thread-id): message` 형태의 라인을 나눕니다.
//! 형식이 어긋난 라인도 에러 없이 처리됩니다 (메시지가 비거나 타임스탬프가 현재 시각이 됨).

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};

/// 브로커 로그 타임스탬프 형식 (`2024-01-01T10:00:00:000`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S:%3f";

/// 메시지 앞의 구분자
const MESSAGE_SEPARATOR: &str = "): ";

/// 타임스탬프 뒤의 구분자
const TIMESTAMP_END: &str = "] (";

/// 심각도 태그
const SEVERITY_TAGS: [&str; 2] = ["INFO [", "WARN ["];

/// 분해된 엔트리
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryParts<'a> {
    /// 심각도 태그를 제거한 타임스탬프 문자열
    pub timestamp: &'a str,
    /// 첫 `"): "` 이후 전체 (없으면 빈 문자열)
    pub message: &'a str,
}

/// 정제된 라인을 타임스탬프와 메시지로 나눕니다.
pub fn split_entry(entry: &str) -> EntryParts<'_> {
    let (head, message) = entry
        .split_once(MESSAGE_SEPARATOR)
        .unwrap_or((entry, ""));

    let head = head
        .split_once(TIMESTAMP_END)
        .map_or(head, |(ts, _)| ts);

    let timestamp = SEVERITY_TAGS
        .iter()
        .find_map(|tag| head.find(tag).map(|idx| &head[idx + tag.len()..]))
        .unwrap_or(head);

    EntryParts { timestamp, message }
}

/// 타임스탬프를 로컬 시간대 기준으로 파싱합니다.
///
/// 파싱에 실패하면 `now`를 반환합니다. 서머타임 전환으로 존재하지 않는 시각은
/// 한 시간 뒤로 밀어서 해석합니다.
pub fn parse_timestamp(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| {
            resolve_local(naive, |n| {
                Local
                    .from_local_datetime(n)
                    .earliest()
                    .map(|local| local.with_timezone(&Utc))
            })
        })
        .unwrap_or(now)
}

/// 로컬 시각을 UTC로 변환합니다. 전환 구간(gap)에 걸리면 한 시간 뒤 시각으로 재시도합니다.
fn resolve_local<F>(naive: NaiveDateTime, lookup: F) -> Option<DateTime<Utc>>
where
    F: Fn(&NaiveDateTime) -> Option<DateTime<Utc>>,
{
    lookup(&naive).or_else(|| {
        naive
            .checked_add_signed(TimeDelta::hours(1))
            .and_then(|shifted| lookup(&shifted))
    })
}
