//! # sagechat-llm-api
//!
//! Client for the OpenAI-compatible chat completion API that backs the
//! proxy. DeepSeek is the default provider.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sagechat_llm_api::{ClientFactory, ProviderConfig};
//! use sagechat_llm_api::client::ChatMessage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ClientFactory::create(ProviderConfig::new("your-api-key"))?;
//!
//!     let messages = vec![ChatMessage::new("user", "你好")];
//!     let reply = client.complete(&messages).await?;
//!     println!("Response: {}", reply);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;

pub use client::{
    deepseek::{DeepSeekClient, RetryConfig},
    ChatMessage, LlmClient, ProviderError, SamplingParams,
};

pub use config::{normalize_api_url, ClientFactory, ProviderConfig, DEEPSEEK_API_URL, DEFAULT_MODEL};
