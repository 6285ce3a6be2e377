#![no_main]

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

use streamr_monitor_core::types::NodeStatus;
use streamr_monitor_log_pipeline::EntryClassifier;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    timestamp: String,
    prefix: FuzzPrefix,
    remainder: String,
}

/// 규칙 테이블의 접두어 (나머지 텍스트 추출 경로를 고르게 타도록)
#[derive(Arbitrary, Debug)]
enum FuzzPrefix {
    Version,
    EthereumAddress,
    Name,
    Http,
    Websocket,
    Plugins,
    Peers,
    Tracker,
    Nat,
    RewardCode,
    Claimed,
    Mqtt,
    Raw,
}

impl FuzzPrefix {
    fn as_str(&self) -> &'static str {
        match self {
            FuzzPrefix::Version => "Starting broker version ",
            FuzzPrefix::EthereumAddress => "Ethereum address ",
            FuzzPrefix::Name => "Welcome to the Streamr Network. Your node's generated name is ",
            FuzzPrefix::Http => "HTTP server listening on ",
            FuzzPrefix::Websocket => "Websocket server listening on port ",
            FuzzPrefix::Plugins => "Plugins: ",
            FuzzPrefix::Peers => "Successfully connected to ",
            FuzzPrefix::Tracker => "Connected to tracker ",
            FuzzPrefix::Nat => "NAT type: ",
            FuzzPrefix::RewardCode => "Reward code received: ",
            FuzzPrefix::Claimed => "Reward claimed successfully, current stake ",
            FuzzPrefix::Mqtt => "MQTT server listening on port ",
            FuzzPrefix::Raw => "",
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let classifier = EntryClassifier::new();
    let mut status = NodeStatus::default();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let line = format!(
        "INFO [{}] (fuzz): {}{}",
        input.timestamp,
        input.prefix.as_str(),
        input.remainder
    );

    // 추출 실패는 Err로 돌아와야 하며 패닉은 허용되지 않는다
    let _ = classifier.apply_at(&line, &mut status, now);

    // 어떤 결과든 updatedAt은 채워진다
    assert!(status.updated_at.is_some());
});
