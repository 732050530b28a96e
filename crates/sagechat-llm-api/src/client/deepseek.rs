use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::{ChatMessage, LlmClient, ProviderError, SamplingParams};
use crate::config::normalize_api_url;

/// Backoff schedule for transient provider failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        let next = (delay.as_millis() as f64 * self.multiplier)
            .min(self.max_delay.as_millis() as f64);
        Duration::from_millis(next as u64)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(flatten)]
    sampling: &'a SamplingParams,
}

/// DeepSeek chat completion client (OpenAI-compatible API)
pub struct DeepSeekClient {
    api_key: String,
    model: String,
    api_url: String,
    sampling: SamplingParams,
    retry: RetryConfig,
    client: reqwest::Client,
}

impl DeepSeekClient {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(api_key: String, model: String, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_key,
            model,
            api_url: normalize_api_url(base_url),
            sampling: SamplingParams::default(),
            retry: RetryConfig::default(),
            client,
        })
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    async fn send_once(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            sampling: &self.sampling,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response.text().await?;
        let body: serde_json::Value = serde_json::from_str(&response_text)?;

        // A reply without a choice or content is an empty answer, not an error.
        Ok(body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl LlmClient for DeepSeekClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut attempt = 0;
        let mut delay = self.retry.initial_delay;

        loop {
            debug!(
                model = %self.model,
                messages = messages.len(),
                attempt,
                "sending completion request"
            );
            match self.send_once(messages).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!("Attempt {} failed: {}. Retrying in {:?}", attempt, e, delay);
                    tokio::time::sleep(delay).await;
                    delay = self.retry.next_delay(delay);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let retry = RetryConfig::default();
        let mut delay = retry.initial_delay;
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(delay.as_millis());
            delay = retry.next_delay(delay);
        }
        assert_eq!(seen, vec![500, 1000, 2000, 4000, 8000, 8000]);
    }

    #[test]
    fn request_body_flattens_sampling() {
        let messages = vec![ChatMessage::new("user", "hi")];
        let sampling = SamplingParams::default();
        let body = serde_json::to_value(CompletionRequest {
            model: "deepseek-chat",
            messages: &messages,
            sampling: &sampling,
        })
        .unwrap();

        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["temperature"], 0.8);
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn base_url_is_normalized() {
        let client =
            DeepSeekClient::new("k".into(), "m".into(), "https://api.deepseek.com/v1/").unwrap();
        assert_eq!(client.api_url(), "https://api.deepseek.com/v1/chat/completions");
    }
}
