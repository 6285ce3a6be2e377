//! 도메인 타입 — 노드 상태 레코드
//!
//! [`NodeStatus`]는 한 노드의 로그를 한 사이클 동안 파싱하여 누적한 결과입니다.
//! 발행(publish) 시 camelCase JSON으로 직렬화되며, 값이 없는 필드는 `null`로,
//! 타임스탬프는 밀리초 정밀도의 ISO 문자열(`2024-01-01T10:00:00.000Z`)로 표현됩니다.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 브로커 내장 서버(HTTP, MQTT, Websocket)의 리스닝 상태
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    /// 리스닝 여부
    pub listening: bool,
    /// 리스닝 포트 (파싱 실패 시 None)
    pub port: Option<u16>,
}

impl ServerStatus {
    /// 리스닝 중인 서버 상태를 생성합니다.
    pub fn listening(port: Option<u16>) -> Self {
        Self {
            listening: true,
            port,
        }
    }
}

/// 리워드 코드 관련 상태
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardStatus {
    /// 잔액 (현재 로그에서는 채워지지 않음)
    pub balance: Option<f64>,
    /// 마지막 리워드 코드 수령 시각
    #[serde(serialize_with = "js_date::serialize")]
    pub last_reward_code_received_at: Option<DateTime<Utc>>,
    /// 마지막 리워드 코드 청구 시각
    #[serde(serialize_with = "js_date::serialize")]
    pub last_reward_code_claimed_at: Option<DateTime<Utc>>,
}

/// 노드 상태 레코드
///
/// 매 사이클 시작 시 기본값으로 초기화되고, 로그 라인 순서대로 갱신됩니다.
/// 사이클 간에 이어지는 상태는 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// 노드의 이더리움 주소
    pub ethereum_address: Option<String>,
    /// 노드가 보고한 생성 이름
    pub name: Option<String>,
    /// 브로커 버전
    pub version: Option<String>,
    /// HTTP 서버 상태
    pub http: ServerStatus,
    /// MQTT 서버 상태
    pub mqtt: ServerStatus,
    /// Websocket 서버 상태
    pub websocket: ServerStatus,
    /// 연결된 피어 목록 (마지막 라인 기준으로 교체)
    pub peers: Vec<String>,
    /// 연결된 트래커 목록 (중복 없음, 최초 관측 순서)
    pub trackers: Vec<String>,
    /// 감지된 NAT 유형
    pub nat: Option<String>,
    /// 플러그인 설정 (스키마 검증 없이 그대로 전달)
    pub plugins: serde_json::Value,
    /// 리워드 상태
    pub rewards: RewardStatus,
    /// 현재 스테이크
    pub stake: Option<u64>,
    /// 마지막으로 처리한 로그 라인의 시각
    #[serde(serialize_with = "js_date::serialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for NodeStatus {
    fn default() -> Self {
        Self {
            ethereum_address: None,
            name: None,
            version: None,
            http: ServerStatus::default(),
            mqtt: ServerStatus::default(),
            websocket: ServerStatus::default(),
            peers: Vec::new(),
            trackers: Vec::new(),
            nat: None,
            plugins: serde_json::Value::Array(Vec::new()),
            rewards: RewardStatus::default(),
            stake: None,
            updated_at: None,
        }
    }
}

impl NodeStatus {
    /// 트래커를 추가합니다. 이미 있는 트래커는 무시합니다.
    ///
    /// 새로 추가되었으면 `true`를 반환합니다.
    pub fn add_tracker(&mut self, tracker: impl Into<String>) -> bool {
        let tracker = tracker.into();
        if self.trackers.contains(&tracker) {
            return false;
        }
        self.trackers.push(tracker);
        true
    }
}

/// JavaScript `Date#toJSON` 형식 직렬화
mod js_date {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_status_serializes_with_nulls() {
        let json = serde_json::to_value(NodeStatus::default()).unwrap();
        assert!(json["ethereumAddress"].is_null());
        assert!(json["updatedAt"].is_null());
        assert_eq!(json["http"]["listening"], false);
        assert!(json["http"]["port"].is_null());
        assert_eq!(json["plugins"], serde_json::json!([]));
        assert!(json["rewards"]["lastRewardCodeClaimedAt"].is_null());
        assert_eq!(json["peers"], serde_json::json!([]));
    }

    #[test]
    fn timestamps_use_millisecond_iso_format() {
        let status = NodeStatus {
            updated_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()),
            ..Default::default()
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["updatedAt"], "2024-01-01T10:00:00.000Z");
    }

    #[test]
    fn add_tracker_deduplicates() {
        let mut status = NodeStatus::default();
        assert!(status.add_tracker("abc"));
        assert!(!status.add_tracker("abc"));
        assert!(status.add_tracker("def"));
        assert_eq!(status.trackers, vec!["abc", "def"]);
    }
}
