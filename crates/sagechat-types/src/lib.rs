//! Core types and structures for sagechat
//!
//! This crate provides the data model shared by the session store, the
//! dispatch loop, the proxy server and the browser frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

// ============================================================================
// Constants
// ============================================================================

/// Greeting seeded into every new chat history
pub const GREETING: &str = "你好！我是你的 AI 助手。让我们开始对话吧！";

/// Assistant message appended once a submission exhausts its retries
pub const FAILURE_MESSAGE: &str = "抱歉，多次尝试后仍然失败。请检查网络连接或稍后重试。";

/// Prefix for default chat titles ("新对话 3")
pub const DEFAULT_TITLE_PREFIX: &str = "新对话";

/// Storage key holding the JSON array of chat histories
pub const HISTORIES_KEY: &str = "chatHistories";

/// Storage key holding the active chat id as a plain string
pub const CURRENT_CHAT_KEY: &str = "currentChatId";

/// Maximum number of retries for a failed submission
pub const MAX_RETRIES: u32 = 3;

/// Base delay of the linear retry schedule, in milliseconds
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Path of the proxy endpoint
pub const CHAT_API_PATH: &str = "/api/chat";

// ============================================================================
// Message Types
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Speaker label used in exported transcripts
    pub fn transcript_label(&self) -> &'static str {
        match self {
            Role::User => "你",
            Role::Assistant => "AI",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static LAST_MESSAGE_ID: AtomicI64 = AtomicI64::new(0);

/// Allocate a time-derived message id.
///
/// Ids are epoch milliseconds, bumped past the previous id when two
/// messages land in the same millisecond, so they stay unique and ordered.
pub fn next_message_id(now: DateTime<Utc>) -> String {
    let candidate = now.timestamp_millis();
    let mut last = LAST_MESSAGE_ID.load(Ordering::Relaxed);
    loop {
        let next = candidate.max(last + 1);
        match LAST_MESSAGE_ID.compare_exchange_weak(
            last,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// A single message shown in a chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: next_message_id(now),
            content: content.into(),
            role,
            timestamp: now,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// The `{role, content}` pair sent over the wire
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Helper function to deserialize string or null values
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

// ============================================================================
// Chat History
// ============================================================================

/// One saved conversation thread with its own message list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_starred: bool,
}

impl ChatHistory {
    /// Create a history seeded with the assistant greeting
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            messages: vec![ChatMessage::assistant(GREETING)],
            created_at: Utc::now(),
            is_starred: false,
        }
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Title given to the n-th chat when it is created
pub fn default_title(n: usize) -> String {
    format!("{} {}", DEFAULT_TITLE_PREFIX, n)
}

// ============================================================================
// Wire Types
// ============================================================================

/// `{role, content}` pair exchanged with the proxy endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub content: String,
}

/// A message as received by the proxy. The role is forwarded to the
/// provider as sent, so `system` or any other role passes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub role: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub content: String,
}

impl From<&WireMessage> for RequestMessage {
    fn from(message: &WireMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<RequestMessage>,
}

/// Body of a failed `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
    pub details: String,
}
