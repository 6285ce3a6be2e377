//! 필드 추출기
//!
//! 규칙 접두어를 제거한 나머지 텍스트(remainder)에서 값을 꺼냅니다.
//! Plugins JSON을 제외하면 실패하지 않고, 값이 없으면 `None`이나 빈 목록을 돌려줍니다.

use crate::error::LogPipelineError;

/// 이름 문장의 고정 머리말
const GENERATED_NAME_PREFIX: &str = "Your node's generated name is ";

/// 리워드 청구 문장에서 스테이크 앞의 머리말
const CURRENT_STAKE_PREFIX: &str = ", current stake ";

/// 앞뒤 공백을 제거한 나머지 텍스트
pub fn text(remainder: &str) -> String {
    remainder.trim().to_owned()
}

/// `Welcome to the Streamr Network.` 이후에서 노드 이름을 꺼냅니다.
///
/// `Your node's generated name is X.` 형식이면 `X`, 아니면 나머지 전체에서 끝의 마침표를 뗍니다.
pub fn generated_name(remainder: &str) -> String {
    let remainder = remainder.trim();
    let name = remainder
        .find(GENERATED_NAME_PREFIX)
        .map_or(remainder, |idx| &remainder[idx + GENERATED_NAME_PREFIX.len()..]);
    name.trim_end().trim_end_matches('.').trim().to_owned()
}

/// 끝에 붙은 정수(포트)를 꺼냅니다. 숫자가 없거나 범위를 벗어나면 `None`입니다.
pub fn trailing_port(remainder: &str) -> Option<u16> {
    let trimmed = remainder.trim_end();
    let start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    trimmed[start..].parse().ok()
}

/// 첫 `" ("` 뒤의 괄호 그룹 안에 있는 쉼표 구분 목록을 꺼냅니다.
///
/// 괄호 그룹이 없으면 빈 목록입니다.
pub fn peer_list(remainder: &str) -> Vec<String> {
    let Some((_, group)) = remainder.split_once(" (") else {
        return Vec::new();
    };
    let group = group.split_once("), ").map_or(group, |(inner, _)| inner);
    let group = group.split_once(')').map_or(group, |(inner, _)| inner);

    group
        .split(',')
        .map(str::trim)
        .filter(|peer| !peer.is_empty())
        .map(str::to_owned)
        .collect()
}

/// 나머지를 JSON으로 파싱합니다. 스키마는 검증하지 않습니다.
pub fn plugins(remainder: &str) -> Result<serde_json::Value, LogPipelineError> {
    serde_json::from_str(remainder).map_err(|e| LogPipelineError::Parse {
        field: "plugins".to_owned(),
        reason: e.to_string(),
    })
}

/// 리워드 청구 문장에서 스테이크를 꺼냅니다.
///
/// `, current stake 1234 DATA` 형식이면 `1234`, 아니면 나머지 첫 토큰의 선행 숫자입니다.
pub fn stake(remainder: &str) -> Option<u64> {
    let rest = remainder
        .find(CURRENT_STAKE_PREFIX)
        .map_or(remainder, |idx| &remainder[idx + CURRENT_STAKE_PREFIX.len()..]);
    let token = rest.split_whitespace().next()?;
    let digits_end = token
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(token.len(), |(idx, _)| idx);
    token[..digits_end].parse().ok()
}
