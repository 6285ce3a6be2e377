//! 필드 규칙 -- 메시지 접두어로 상태 필드를 선택하고 갱신합니다.
//!
//! 규칙은 순서가 있는 `(접두어, FieldRule)` 테이블이며, 첫 번째로 일치하는 규칙만 적용됩니다.
//!
//! # 아키텍처
//! - [`FieldRule`]: 갱신 대상 필드를 나타내는 태그 enum
//! - [`extract`]: 나머지 텍스트에서 값을 꺼내는 순수 함수
//! - [`skip`]: 분류 전에 버리는 메시지 접두어 목록

pub mod extract;
pub mod skip;

pub use skip::{DEFAULT_SKIP_PREFIXES, SkipFilter, should_skip};

use chrono::{DateTime, Utc};
use streamr_monitor_core::types::{NodeStatus, ServerStatus};

use crate::error::LogPipelineError;

/// 상태 필드 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRule {
    /// 브로커 버전
    Version,
    /// 이더리움 주소
    EthereumAddress,
    /// 생성된 노드 이름
    Name,
    /// HTTP 서버 리스닝
    Http,
    /// MQTT 서버 리스닝
    Mqtt,
    /// Websocket 서버 리스닝
    Websocket,
    /// 연결된 피어 목록
    Peers,
    /// 연결된 트래커
    Tracker,
    /// NAT 유형
    Nat,
    /// 플러그인 설정 JSON
    Plugins,
    /// 리워드 코드 수령
    RewardCodeReceived,
    /// 리워드 청구 성공
    RewardClaimed,
}

/// 접두어 테이블 (순서대로 검사)
pub const RULES: [(&str, FieldRule); 12] = [
    ("Starting broker version", FieldRule::Version),
    ("Ethereum address ", FieldRule::EthereumAddress),
    ("Welcome to the Streamr Network.", FieldRule::Name),
    ("HTTP server listening", FieldRule::Http),
    ("MQTT server listening on port", FieldRule::Mqtt),
    ("Websocket server listening", FieldRule::Websocket),
    ("Successfully connected to", FieldRule::Peers),
    ("Connected to tracker ", FieldRule::Tracker),
    ("NAT type: ", FieldRule::Nat),
    ("Plugins: ", FieldRule::Plugins),
    ("Reward code received:", FieldRule::RewardCodeReceived),
    ("Reward claimed successfully", FieldRule::RewardClaimed),
];

impl FieldRule {
    /// 메시지에 일치하는 첫 규칙과 접두어 이후 나머지 텍스트를 반환합니다.
    pub fn classify(message: &str) -> Option<(Self, &str)> {
        RULES.iter().find_map(|(prefix, rule)| {
            message
                .strip_prefix(prefix)
                .map(|remainder| (*rule, remainder))
        })
    }

    #[cfg(test)]
    fn prefix(self) -> &'static str {
        RULES
            .iter()
            .find(|(_, rule)| *rule == self)
            .map_or("", |(prefix, _)| prefix)
    }

    /// 메트릭 레이블용 필드 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::EthereumAddress => "ethereum_address",
            Self::Name => "name",
            Self::Http => "http",
            Self::Mqtt => "mqtt",
            Self::Websocket => "websocket",
            Self::Peers => "peers",
            Self::Tracker => "trackers",
            Self::Nat => "nat",
            Self::Plugins => "plugins",
            Self::RewardCodeReceived => "reward_code_received",
            Self::RewardClaimed => "reward_claimed",
        }
    }

    /// 규칙을 적용하여 상태를 갱신합니다.
    ///
    /// 에러가 나면 상태는 변경되지 않습니다.
    pub fn apply(
        self,
        remainder: &str,
        timestamp: DateTime<Utc>,
        status: &mut NodeStatus,
    ) -> Result<(), LogPipelineError> {
        match self {
            Self::Version => status.version = Some(extract::text(remainder)),
            Self::EthereumAddress => status.ethereum_address = Some(extract::text(remainder)),
            Self::Name => status.name = Some(extract::generated_name(remainder)),
            Self::Http => status.http = ServerStatus::listening(extract::trailing_port(remainder)),
            Self::Mqtt => status.mqtt = ServerStatus::listening(extract::trailing_port(remainder)),
            Self::Websocket => {
                status.websocket = ServerStatus::listening(extract::trailing_port(remainder))
            }
            Self::Peers => status.peers = extract::peer_list(remainder),
            Self::Tracker => {
                let tracker = extract::text(remainder);
                if !tracker.is_empty() {
                    status.add_tracker(tracker);
                }
            }
            Self::Nat => status.nat = Some(extract::text(remainder)),
            Self::Plugins => status.plugins = extract::plugins(remainder)?,
            Self::RewardCodeReceived => {
                status.rewards.last_reward_code_received_at = Some(timestamp);
            }
            Self::RewardClaimed => {
                status.rewards.last_reward_code_claimed_at = Some(timestamp);
                status.stake = extract::stake(remainder);
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for FieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
