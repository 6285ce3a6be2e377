//! 스킵 필터 -- 분류기에 도달하면 안 되는 메시지 접두어 목록

/// 기본 스킵 접두어 (NAT 탐색, 연결 종료 노이즈, 마이너 플러그인 배너 등)
pub const DEFAULT_SKIP_PREFIXES: [&str; 11] = [
    "Analyzing NAT type",
    "conn.close(",
    "Brubeck miner plugin started",
    "View your node in the Network Explorer:",
    "WebRTC private address probing is allowed.",
    "Unable to publish NodeMetrics",
    "failed to subscribe (or connect) to",
    "unexpected iceCandidate from",
    "close connection to",
    "Could not connect to tracker",
    "Network node ",
];

/// 기본 목록만으로 메시지를 스킵할지 판단합니다.
pub fn should_skip(message: &str) -> bool {
    DEFAULT_SKIP_PREFIXES
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

/// 기본 목록에 설정된 추가 접두어를 더한 스킵 필터
#[derive(Debug, Clone, Default)]
pub struct SkipFilter {
    extra_prefixes: Vec<String>,
}

impl SkipFilter {
    /// 기본 목록만 사용하는 필터를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 추가 접두어를 포함한 필터를 생성합니다. 빈 접두어는 무시합니다.
    pub fn with_extra_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra_prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// 메시지가 스킵 대상인지 확인합니다 (대소문자 구분, 접두어 일치).
    pub fn should_skip(&self, message: &str) -> bool {
        should_skip(message)
            || self
                .extra_prefixes
                .iter()
                .any(|prefix| message.starts_with(prefix.as_str()))
    }

    /// 추가 접두어 수를 반환합니다.
    pub fn extra_count(&self) -> usize {
        self.extra_prefixes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_prefix_is_skipped() {
        for prefix in DEFAULT_SKIP_PREFIXES {
            assert!(should_skip(prefix), "exact prefix {prefix:?}");
            let extended = format!("{prefix} trailing detail 123");
            assert!(should_skip(&extended), "extended {extended:?}");
        }
    }

    #[test]
    fn matching_is_case_sensitive_prefix_only() {
        assert!(!should_skip("analyzing NAT type"));
        assert!(!should_skip("Now Analyzing NAT type"));
        assert!(!should_skip("NAT type: Full Cone"));
        assert!(!should_skip(""));
    }

    #[test]
    fn extra_prefixes_extend_defaults() {
        let filter = SkipFilter::with_extra_prefixes(["Heartbeat", ""]);
        assert_eq!(filter.extra_count(), 1);
        assert!(filter.should_skip("Heartbeat sent"));
        assert!(filter.should_skip("close connection to 0xabc"));
        assert!(!filter.should_skip("HTTP server listening on 7171"));
    }
}
