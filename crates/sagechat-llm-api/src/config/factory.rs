use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::client::{deepseek::DeepSeekClient, LlmClient, SamplingParams};
use crate::config::{DEEPSEEK_API_URL, DEFAULT_MODEL};

/// Everything needed to build a provider client
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub sampling: SamplingParams,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEEPSEEK_API_URL.to_string(),
            sampling: SamplingParams::default(),
        }
    }
}

/// Client factory for creating LLM clients
pub struct ClientFactory;

impl ClientFactory {
    /// Create the provider client described by `config`
    ///
    /// # Returns
    /// Arc-wrapped LLM client implementing the LlmClient trait
    pub fn create(config: ProviderConfig) -> Result<Arc<dyn LlmClient>> {
        let client = DeepSeekClient::new(config.api_key, config.model, &config.base_url)?
            .with_sampling(config.sampling);
        info!(model = %client.model(), url = %client.api_url(), "created provider client");
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_deepseek_chat() {
        let client = ClientFactory::create(ProviderConfig::new("key")).unwrap();
        assert_eq!(client.model(), "deepseek-chat");
    }
}
