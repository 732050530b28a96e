//! Native implementations of the dispatch ports.

use async_trait::async_trait;
use sagechat_dispatch::{ChatEndpoint, EndpointError, Timer};
use sagechat_types::{WireMessage, CHAT_API_PATH};
use std::time::Duration;
use tracing::debug;

/// Posts conversations to a sagechat proxy over HTTP
pub struct HttpChatEndpoint {
    url: String,
    client: reqwest::Client,
}

impl HttpChatEndpoint {
    pub fn new(base_url: &str) -> Self {
        Self {
            url: format!("{}{}", base_url.trim_end_matches('/'), CHAT_API_PATH),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait(?Send)]
impl ChatEndpoint for HttpChatEndpoint {
    async fn send(&self, messages: &[WireMessage]) -> Result<WireMessage, EndpointError> {
        debug!(url = %self.url, messages = messages.len(), "posting conversation");

        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "messages": messages }))
            .send()
            .await
            .map_err(|e| EndpointError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EndpointError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<WireMessage>()
            .await
            .map_err(|e| EndpointError::Decode(e.to_string()))
    }
}

/// Retry delays on the tokio clock
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait(?Send)]
impl Timer for TokioTimer {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
