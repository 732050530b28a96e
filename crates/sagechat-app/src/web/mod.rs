// Chat proxy server
pub mod routes;
pub mod sanitize;
pub mod server;

pub use routes::{create_router, AppError, AppState};
pub use sanitize::strip_markdown;
pub use server::{WebServer, WebServerConfig};
