use async_trait::async_trait;
use gloo_net::http::Request;
use sagechat_dispatch::{ChatEndpoint, EndpointError, Timer};
use sagechat_types::{WireMessage, CHAT_API_PATH};
use std::time::Duration;

/// Posts conversations to the proxy that served the page
pub struct FetchEndpoint {
    url: String,
}

impl FetchEndpoint {
    pub fn new() -> Self {
        Self::with_url(CHAT_API_PATH)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for FetchEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl ChatEndpoint for FetchEndpoint {
    async fn send(&self, messages: &[WireMessage]) -> Result<WireMessage, EndpointError> {
        let response = Request::post(&self.url)
            .json(&serde_json::json!({ "messages": messages }))
            .map_err(|e| EndpointError::Network(format!("Failed to serialize request: {:?}", e)))?
            .send()
            .await
            .map_err(|e| EndpointError::Network(format!("Request failed: {:?}", e)))?;

        if !response.ok() {
            let body = response.text().await.unwrap_or_default();
            return Err(EndpointError::Status {
                status: response.status(),
                body,
            });
        }

        response
            .json::<WireMessage>()
            .await
            .map_err(|e| EndpointError::Decode(format!("Failed to parse response: {:?}", e)))
    }
}

/// Retry delays on the browser event loop
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTimer;

#[async_trait(?Send)]
impl Timer for GlooTimer {
    async fn sleep(&self, delay: Duration) {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::future::TimeoutFuture::new(millis).await;
    }
}
