//! SageChat application library
//!
//! The chat proxy server, the terminal client and the glue between them.

// Re-export workspace crates
pub use sagechat_dispatch as dispatch;
pub use sagechat_llm_api as llm_api;
pub use sagechat_store as store;
pub use sagechat_types as types;

// Local modules
pub mod app;
pub mod cli;
pub mod config;
pub mod endpoint;
pub mod logging;
pub mod web;

pub use app::{export_history, list_histories, run_repl_mode, run_web_server};
pub use cli::{Cli, Commands};
pub use config::{ConfigError, ServerConfig};
pub use endpoint::{HttpChatEndpoint, TokioTimer};
pub use logging::init_tracing;
