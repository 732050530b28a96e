mod fixtures;

use std::time::Duration;

use fixtures::{LLMMockServer, TEST_API_KEY};
use pretty_assertions::assert_eq;
use sagechat_llm_api::{ChatMessage, DeepSeekClient, LlmClient, RetryConfig, SamplingParams};

fn client(server: &LLMMockServer) -> DeepSeekClient {
    DeepSeekClient::new(TEST_API_KEY.to_string(), "deepseek-chat".to_string(), &server.base_url())
        .unwrap()
        .with_retry(RetryConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
            ..RetryConfig::default()
        })
}

fn conversation() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("你是一个助手"),
        ChatMessage::new("user", "hello"),
    ]
}

#[tokio::test]
async fn returns_assistant_content() {
    let server = LLMMockServer::new().await;
    server.mock_success("hi there").await;

    let reply = client(&server).complete(&conversation()).await.unwrap();

    assert_eq!(reply, "hi there");
    assert_eq!(server.received_count().await, 1);
}

#[tokio::test]
async fn sends_model_messages_and_sampling() {
    let server = LLMMockServer::new().await;
    server.mock_success("ok").await;

    client(&server)
        .with_sampling(SamplingParams {
            temperature: 0.3,
            ..SamplingParams::default()
        })
        .complete(&conversation())
        .await
        .unwrap();

    let body = server.last_body().await;
    assert_eq!(body["model"], "deepseek-chat");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "hello");
    assert_eq!(body["temperature"], 0.3);
    assert_eq!(body["max_tokens"], 1000);
    assert_eq!(body["presence_penalty"], 0.6);
    assert_eq!(body["frequency_penalty"], 0.5);
}

#[tokio::test]
async fn null_content_becomes_empty_string() {
    let server = LLMMockServer::new().await;
    server.mock_null_content().await;

    let reply = client(&server).complete(&conversation()).await.unwrap();

    assert_eq!(reply, "");
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = LLMMockServer::new().await;
    server.mock_status_times(503, 2).await;
    server.mock_success("recovered").await;

    let reply = client(&server).complete(&conversation()).await.unwrap();

    assert_eq!(reply, "recovered");
    assert_eq!(server.received_count().await, 3);
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let server = LLMMockServer::new().await;
    server.mock_error(500, "still broken").await;

    let err = client(&server).complete(&conversation()).await.unwrap_err();

    assert!(err.to_string().contains("500"));
    assert_eq!(server.received_count().await, 4);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = LLMMockServer::new().await;
    server.mock_error(400, "bad request").await;

    let err = client(&server).complete(&conversation()).await.unwrap_err();

    assert!(err.to_string().contains("bad request"));
    assert_eq!(server.received_count().await, 1);
}
