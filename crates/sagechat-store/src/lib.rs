//! Client-side chat session store for sagechat
//!
//! Owns the list of chat histories and the active chat, and writes both to a
//! key-value backend on every mutation. The backend is injected through
//! [`KeyValueStore`] so the same store runs against browser local storage,
//! a directory on disk, or an in-memory map in tests.

pub mod file;
pub mod kv;
pub mod session;
pub mod summary;

pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use session::ChatSessionStore;
pub use summary::{format_created_at, preview, HistorySummary, Transcript};

use thiserror::Error;

/// Errors raised by the session store and its backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access stored key `{key}`")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage backend rejected key `{key}`: {message}")]
    Backend { key: String, message: String },

    #[error("stored value for `{key}` is corrupt")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize chat histories")]
    Serialize(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
