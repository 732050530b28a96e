use serde_json::json;
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-api-key";

/// Mock server utilities for testing the provider client
pub struct LLMMockServer {
    server: MockServer,
}

impl LLMMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL in the form the client expects
    pub fn base_url(&self) -> String {
        format!("{}/v1", self.server.uri())
    }

    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }

    pub async fn last_body(&self) -> serde_json::Value {
        let requests = self.server.received_requests().await.unwrap_or_default();
        requests
            .last()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .unwrap_or_default()
    }

    /// Mock successful chat completion response
    pub async fn mock_success(&self, response_content: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!({
                "role": "assistant",
                "content": response_content
            }))))
            .mount(&self.server)
            .await;
    }

    /// Mock a completion whose message has no content
    pub async fn mock_null_content(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!({
                "role": "assistant",
                "content": null
            }))))
            .mount(&self.server)
            .await;
    }

    /// Fail `times` requests with `status` before falling through to later mocks
    pub async fn mock_status_times(&self, status: u16, times: u64) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {
                    "message": "mocked failure",
                    "type": "server_error"
                }
            })))
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Mock error response for every request
    pub async fn mock_error(&self, status: u16, error_message: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {
                    "message": error_message,
                    "type": "invalid_request_error"
                }
            })))
            .mount(&self.server)
            .await;
    }
}

fn completion(message: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl_test123",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "deepseek-chat",
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 20,
            "total_tokens": 30
        }
    })
}
