#![no_main]

use libfuzzer_sys::fuzz_target;
use streamr_monitor_log_pipeline::sanitize;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let clean = sanitize(&raw);

    // 정제 결과에는 줄바꿈/ESC/C1 CSI가 남지 않고, 다시 정제해도 바뀌지 않아야 한다
    assert!(!clean.contains(['\n', '\r', '\x1b', '\u{9b}']));
    assert_eq!(sanitize(&clean), clean);
});
