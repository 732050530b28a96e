//! # sagechat-dispatch
//!
//! Turns a user submission into an outbound request against the proxy
//! endpoint and appends the outcome to the session store.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Idle ──begin──▶ Sending ──ok──▶ Succeeded
//!                   │  ▲
//!              error│  │timer fired
//!                   ▼  │
//!                 Retrying ──retries exhausted──▶ Failed
//! ```
//!
//! The retry count travels with the in-flight [`Submission`], so a retry
//! always resends the same payload to the same chat.

pub mod capability;
pub mod composer;
pub mod dispatcher;
pub mod policy;
pub mod ports;
pub mod state;
pub mod view;

pub use capability::{
    pick_voice, QuoteSelection, SelectionCapability, SelectionMenu, SelectionRange,
    SpeechAction, SpeechCapability, SpeechSettings, SpeechToggle, VoiceInfo,
};
pub use composer::{Composer, Quote};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use policy::RetryPolicy;
pub use ports::{ChatEndpoint, Timer};
pub use state::{DispatchState, Step, Submission};

use sagechat_store::StoreError;
use thiserror::Error;

/// Why a submission was refused before anything was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No input and no active quote
    Empty,
    /// Another submission is still in flight
    Busy,
}

/// Failure talking to the proxy endpoint
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EndpointError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("submission rejected: {0:?}")]
    Rejected(Rejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}
