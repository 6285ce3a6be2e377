//! 로그 파일 수집기
//!
//! 노드의 pm2 로그 파일(`{log_dir}/{node_id}{suffix}`)을 매 사이클 처음부터 끝까지 읽어
//! 정제된 비어 있지 않은 라인 목록을 돌려줍니다. 읽기 위치는 기억하지 않습니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::parser::sanitize;

/// 로그 파일 수집기
#[derive(Debug, Clone)]
pub struct LogFileCollector {
    log_dir: PathBuf,
    suffix: String,
    read_timeout: Duration,
}

impl LogFileCollector {
    /// 새 수집기를 생성합니다.
    pub fn new(log_dir: impl Into<PathBuf>, suffix: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            log_dir: log_dir.into(),
            suffix: suffix.into(),
            read_timeout,
        }
    }

    /// 파이프라인 설정으로 수집기를 생성합니다.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.log_dir.clone(),
            config.log_file_suffix.clone(),
            Duration::from_secs(config.read_timeout_secs),
        )
    }

    /// 로그 디렉토리
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// 노드의 로그 파일 경로
    pub fn log_path(&self, node_id: &str) -> PathBuf {
        self.log_dir.join(format!("{node_id}{}", self.suffix))
    }

    /// 노드의 로그 파일 전체를 읽어 정제된 라인을 파일 순서대로 반환합니다.
    ///
    /// 공백만 남는 라인은 제외됩니다. UTF-8이 아닌 바이트는 대체 문자로 바뀝니다.
    pub async fn read_lines(&self, node_id: &str) -> Result<Vec<String>, LogPipelineError> {
        let path = self.log_path(node_id);
        let bytes = tokio::time::timeout(self.read_timeout, tokio::fs::read(&path))
            .await
            .map_err(|_| LogPipelineError::ReadTimeout {
                path: path.display().to_string(),
                timeout_secs: self.read_timeout.as_secs(),
            })?
            .map_err(|e| LogPipelineError::Collector {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let content = String::from_utf8_lossy(&bytes);
        let lines = content
            .split('\n')
            .map(sanitize)
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>();

        tracing::debug!(
            node = node_id,
            path = %path.display(),
            bytes = bytes.len(),
            lines = lines.len(),
            "read node log file"
        );

        Ok(lines)
    }
}
