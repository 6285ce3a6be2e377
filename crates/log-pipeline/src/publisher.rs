//! 상태 발행기
//!
//! - [`HttpPublisher`]: 브로커 노드의 HTTP publish 엔드포인트로 POST 합니다.
//!   `POST {endpoint}[:{port}]/streams/{percent-encoded stream id}`,
//!   `Authorization: Bearer {api_key}`, 본문은 [`PublishPayload`]입니다.
//! - [`LogPublisher`]: 발행 대신 페이로드를 로그로 남깁니다 (dry run).

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;
use streamr_monitor_core::config::PublisherConfig;
use streamr_monitor_core::error::{MonitorError, PublishError};
use streamr_monitor_core::pipeline::{BoxFuture, StatusPublisher};
use streamr_monitor_core::types::NodeStatus;

/// 응답 본문을 에러에 담을 때의 최대 길이
const MAX_ERROR_BODY_LEN: usize = 512;

/// 발행 본문 -- 노드 상태에 `pm2Name`을 더한 JSON 객체
#[derive(Debug, Serialize)]
pub struct PublishPayload<'a> {
    #[serde(flatten)]
    pub status: &'a NodeStatus,
    #[serde(rename = "pm2Name")]
    pub node_id: &'a str,
}

/// HTTP 발행기
#[derive(Clone)]
pub struct HttpPublisher {
    client: Client,
    url: Url,
    api_key: String,
}

impl HttpPublisher {
    /// 발행 설정으로 HTTP 발행기를 생성합니다.
    pub fn from_config(config: &PublisherConfig) -> Result<Self, MonitorError> {
        let url = publish_url(&config.endpoint, config.port, &config.stream_id)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PublishError::Request(e.to_string()))?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
        })
    }

    /// 요청 대상 URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn post(&self, node_id: &str, status: &NodeStatus) -> Result<(), MonitorError> {
        let payload = PublishPayload { status, node_id };

        let mut request = self.client.post(self.url.clone()).json(&payload);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| PublishError::Request(e.to_string()))?;
        let status_code = resp.status();

        if !status_code.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_LEN {
                let cut = (0..=MAX_ERROR_BODY_LEN)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(PublishError::Status {
                status: status_code.as_u16(),
                body,
            }
            .into());
        }

        tracing::debug!(node = node_id, status = status_code.as_u16(), "status published");
        Ok(())
    }
}

impl std::fmt::Debug for HttpPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPublisher")
            .field("url", &self.url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl StatusPublisher for HttpPublisher {
    fn name(&self) -> &str {
        "http"
    }

    fn publish<'a>(
        &'a self,
        node_id: &'a str,
        status: &'a NodeStatus,
    ) -> BoxFuture<'a, Result<(), MonitorError>> {
        Box::pin(self.post(node_id, status))
    }
}

/// 발행 URL을 구성합니다.
///
/// 스트림 ID는 하나의 경로 세그먼트로 percent-encoding 됩니다 (`/` → `%2F`).
pub fn publish_url(endpoint: &str, port: Option<u16>, stream_id: &str) -> Result<Url, MonitorError> {
    let invalid = |reason: &str| PublishError::InvalidEndpoint {
        endpoint: endpoint.to_owned(),
        reason: reason.to_owned(),
    };

    if stream_id.is_empty() {
        return Err(invalid("stream id must not be empty").into());
    }

    let mut url = Url::parse(endpoint.trim()).map_err(|e| invalid(&e.to_string()))?;
    if let Some(port) = port {
        url.set_port(Some(port))
            .map_err(|()| invalid("endpoint cannot carry a port"))?;
    }
    url.path_segments_mut()
        .map_err(|()| invalid("endpoint cannot be a base URL"))?
        .pop_if_empty()
        .push("streams")
        .push(stream_id);

    Ok(url)
}

/// 로그 발행기 (dry run)
#[derive(Debug, Clone, Default)]
pub struct LogPublisher;

impl StatusPublisher for LogPublisher {
    fn name(&self) -> &str {
        "log"
    }

    fn publish<'a>(
        &'a self,
        node_id: &'a str,
        status: &'a NodeStatus,
    ) -> BoxFuture<'a, Result<(), MonitorError>> {
        Box::pin(async move {
            let payload = serde_json::to_string(&PublishPayload { status, node_id })
                .map_err(|e| PublishError::Serialize(e.to_string()))?;
            tracing::info!(node = node_id, payload = %payload, "node status (dry run)");
            Ok(())
        })
    }
}

/// 발행 설정에 맞는 발행기를 생성합니다.
///
/// `enabled = false`이면 [`LogPublisher`]를 반환합니다.
pub fn build_publisher(config: &PublisherConfig) -> Result<Arc<dyn StatusPublisher>, MonitorError> {
    if config.enabled {
        let publisher = HttpPublisher::from_config(config)?;
        tracing::info!(url = %publisher.url(), "publishing node status over http");
        Ok(Arc::new(publisher))
    } else {
        tracing::info!("publishing disabled, node status will be logged");
        Ok(Arc::new(LogPublisher))
    }
}
