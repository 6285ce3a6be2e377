//! 로그 라인 정제 및 엔트리 분해
//!
//! pm2가 기록하는 브로커 로그 라인은 다음 형태입니다.
//!
//! ```text
//! \x1b[32mINFO\x1b[39m [2024-01-01T10:00:00:000] (BrubeckMinerPlugin): Reward code received: 0xabc
//! ```
//!
//! - [`sanitize`]: 터미널 제어 시퀀스와 줄바꿈 문자를 제거합니다.
//! - [`split_entry`]: 정제된 라인을 타임스탬프 부분과 메시지 부분으로 나눕니다.
//! - [`parse_timestamp`]: `YYYY-MM-DDTHH:mm:ss:SSS` 타임스탬프를 파싱합니다.

pub mod entry;
pub mod sanitize;

pub use entry::{EntryParts, TIMESTAMP_FORMAT, parse_timestamp, split_entry};
pub use sanitize::sanitize;
