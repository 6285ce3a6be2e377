//! 라인 정제기 -- ANSI 제어 시퀀스 제거
//!
//! CSI(`ESC [ ... m` 등)와 OSC(`ESC ] ... BEL` / `ESC ] ... ESC \\`) 시퀀스를 한 번에 제거하고,
//! 남은 `\n`, `\r`, 짝 없는 ESC / C1 CSI(`\u{9b}`) 문자를 지웁니다.
//! 그 밖의 문자는 건드리지 않습니다.

use std::sync::LazyLock;

use regex::Regex;

/// ANSI 제어 시퀀스 패턴
///
/// OSC는 페이로드(공백 포함)를 BEL 또는 ST까지 통째로 제거합니다.
/// 같은 위치에서는 앞선 대안이 우선하므로 OSC가 CSI보다 먼저 옵니다.
const ANSI_PATTERN: &str = concat!(
    r"\x1B\][^\x07\x1B]*(?:\x07|\x1B\\)",
    r"|[\x1B\x{9B}][\[\]()#;?]*",
    r"(?:(?:(?:(?:;[-a-zA-Z0-9/#&.:=?%@~_]+)*|[a-zA-Z0-9]+(?:;[-a-zA-Z0-9/#&.:=?%@~_]*)*)?\x07)",
    r"|(?:(?:[0-9]{1,4}(?:;[0-9]{0,4})*)?[0-9A-PR-TZcf-ntqry=><~]))",
);

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ANSI_PATTERN).expect("ANSI pattern is a valid regex"));

/// 라인에서 제어 시퀀스와 줄바꿈 문자를 제거합니다.
///
/// 시퀀스 도입 문자(ESC, `\u{9b}`)는 결과에 남지 않으므로 제거 후에 새 시퀀스가
/// 생기지 않고, `sanitize(&sanitize(x)) == sanitize(x)`가 한 번의 패스로 성립합니다.
pub fn sanitize(raw: &str) -> String {
    ANSI_RE
        .replace_all(raw, "")
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\x1b' | '\u{9b}'))
        .collect()
}
