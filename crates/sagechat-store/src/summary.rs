use chrono::{DateTime, Local, TimeZone};
use sagechat_types::ChatHistory;

/// Number of characters shown in a sidebar preview
pub const PREVIEW_CHARS: usize = 50;

/// What the sidebar shows for one chat history
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub id: String,
    pub title: String,
    pub is_starred: bool,
    pub is_active: bool,
    pub created_at: String,
    pub preview: String,
    pub message_count: usize,
}

impl HistorySummary {
    pub fn from_history(history: &ChatHistory, is_active: bool) -> Self {
        Self {
            id: history.id.clone(),
            title: history.title.clone(),
            is_starred: history.is_starred,
            is_active,
            created_at: format_created_at(&history.created_at.with_timezone(&Local)),
            preview: history
                .last_message()
                .map(|m| preview(&m.content, PREVIEW_CHARS))
                .unwrap_or_default(),
            message_count: history.messages.len(),
        }
    }
}

/// Format a creation time the way the sidebar shows it: `2024/01/05 14:03`
pub fn format_created_at<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%Y/%m/%d %H:%M").to_string()
}

/// First `max_chars` characters of `content`, with `...` when cut
pub fn preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Plain-text export of a chat history
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub file_name: String,
    pub content: String,
}

impl Transcript {
    pub fn from_history(history: &ChatHistory) -> Self {
        let content = history
            .messages
            .iter()
            .map(|m| format!("{}: {}", m.role.transcript_label(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            file_name: format!("{}.txt", history.title),
            content,
        }
    }
}
