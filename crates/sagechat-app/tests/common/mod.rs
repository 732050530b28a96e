use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sagechat::llm_api::{ChatMessage, LlmClient};
use std::sync::Mutex;

/// Provider stand-in that records every conversation it is sent
pub struct MockLlm {
    reply: std::result::Result<String, String>,
    pub received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlm {
    pub fn replying(content: &str) -> Self {
        Self {
            reply: Ok(content.to_string()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Vec<ChatMessage> {
        self.received.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.received.lock().unwrap().push(messages.to_vec());
        self.reply.clone().map_err(|e| anyhow!(e))
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
