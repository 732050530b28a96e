use std::time::Duration;

use sagechat_types::{ChatMessage, WireMessage};

/// Where the dispatch loop currently is
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    /// Request in flight; `attempt` is 1 for the first try
    Sending { attempt: u32 },
    /// Waiting `delay` before retry number `retry`
    Retrying { retry: u32, delay: Duration },
    Failed,
    Succeeded,
}

impl DispatchState {
    /// A submission in flight blocks new ones
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Sending { .. } | Self::Retrying { .. })
    }
}

/// One accepted submission, carried through sends and retries
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Chat the reply belongs to, fixed when the submission began
    pub chat_id: String,
    /// The user message appended when the submission began
    pub user_message: ChatMessage,
    /// Conversation snapshot sent on every attempt
    pub payload: Vec<WireMessage>,
    /// Retries used so far
    pub retries: u32,
}

impl Submission {
    /// 1-based number of the attempt about to be made
    pub fn attempt(&self) -> u32 {
        self.retries + 1
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Retry { submission: Submission, delay: Duration },
    /// Retries exhausted; the failure message was appended
    GaveUp(ChatMessage),
}
