//! Terminal client stack against a live proxy on an ephemeral port.

mod common;

use common::MockLlm;
use pretty_assertions::assert_eq;
use sagechat::dispatch::{Composer, DispatchOutcome, Dispatcher, RetryPolicy};
use sagechat::store::{ChatSessionStore, MemoryStore};
use sagechat::types::{ChatHistory, Role, CURRENT_CHAT_KEY, FAILURE_MESSAGE, HISTORIES_KEY};
use sagechat::web::{AppState, WebServer, WebServerConfig};
use sagechat::{HttpChatEndpoint, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_proxy(llm: Arc<MockLlm>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = WebServer::new(
        WebServerConfig {
            bind_addr: addr,
            web_dir: None,
        },
        AppState::new(llm, "system"),
    );
    tokio::spawn(server.serve(listener));
    addr
}

#[tokio::test]
async fn hello_gets_a_reply_and_both_are_persisted() {
    let llm = Arc::new(MockLlm::replying("hi there"));
    let addr = spawn_proxy(llm.clone()).await;

    let mut store = ChatSessionStore::load(MemoryStore::new()).unwrap();
    let chat_id = store.ensure_active_chat().unwrap();
    let mut composer = Composer::new();
    composer.set_input("hello");
    let endpoint = HttpChatEndpoint::new(&format!("http://{}", addr));
    let mut dispatcher = Dispatcher::default();

    let outcome = dispatcher
        .send(&mut store, &mut composer, &endpoint, &TokioTimer)
        .await
        .unwrap();

    assert!(matches!(outcome, DispatchOutcome::Replied(ref m) if m.content == "hi there"));

    let storage = store.storage();
    assert_eq!(storage.get(CURRENT_CHAT_KEY), Some(chat_id.as_str()));
    let saved: Vec<ChatHistory> =
        serde_json::from_str(storage.get(HISTORIES_KEY).unwrap()).unwrap();
    let chat = saved.iter().find(|h| h.id == chat_id).unwrap();
    let exchanged: Vec<(Role, &str)> = chat
        .messages
        .iter()
        .skip(1)
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(exchanged, vec![(Role::User, "hello"), (Role::Assistant, "hi there")]);

    // greeting + user message, behind the system prompt
    let sent = llm.last_request();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2].content, "hello");
}

#[tokio::test]
async fn provider_outage_ends_in_a_single_failure_message() {
    let llm = Arc::new(MockLlm::failing("upstream down"));
    let addr = spawn_proxy(llm.clone()).await;

    let mut store = ChatSessionStore::load(MemoryStore::new()).unwrap();
    let mut composer = Composer::new();
    composer.set_input("hello");
    let endpoint = HttpChatEndpoint::new(&format!("http://{}", addr));
    let mut dispatcher = Dispatcher::new(RetryPolicy::new(3, Duration::from_millis(5)));

    let outcome = dispatcher
        .send(&mut store, &mut composer, &endpoint, &TokioTimer)
        .await
        .unwrap();

    assert!(matches!(outcome, DispatchOutcome::GaveUp(_)));
    assert_eq!(llm.received.lock().unwrap().len(), 4);

    let contents: Vec<&str> = store.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents.iter().filter(|c| **c == FAILURE_MESSAGE).count(), 1);
    assert_eq!(contents.iter().filter(|c| **c == "hello").count(), 1);
}
