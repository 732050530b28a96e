pub mod factory;
pub use factory::{ClientFactory, ProviderConfig};

/// Default DeepSeek API base URL
pub const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1";

/// Default model name
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Normalize an API base URL into the chat completions endpoint
pub fn normalize_api_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Already a full endpoint
    if url.ends_with("/completions") {
        return url.to_string();
    }

    if url.ends_with("/v1") {
        format!("{}/chat/completions", url)
    } else {
        format!("{}/v1/chat/completions", url)
    }
}
