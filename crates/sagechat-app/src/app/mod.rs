pub mod commands;
pub mod repl;
pub mod web_server;

pub use commands::{export_history, list_histories, open_store};
pub use repl::run_repl_mode;
pub use web_server::run_web_server;
