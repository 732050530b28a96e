use anyhow::Result;
use axum::http::{header, Method};
use axum::Router;
use colored::Colorize;
use sagechat_llm_api::LlmClient;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::web::routes::{self, AppState};

/// Web server configuration
pub struct WebServerConfig {
    pub bind_addr: SocketAddr,
    pub web_dir: Option<PathBuf>,
}

/// Web server instance
pub struct WebServer {
    config: WebServerConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(config: WebServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Full application: API routes, CORS, request tracing and static files
    pub fn router(&self) -> Router {
        let mut app = routes::create_router(self.state.clone());

        if let Some(web_dir) = &self.config.web_dir {
            if web_dir.exists() {
                info!(dir = %web_dir.display(), "serving static files");
                app = app.fallback_service(ServeDir::new(web_dir));
            } else {
                warn!(
                    dir = %web_dir.display(),
                    "web directory does not exist, not serving static files"
                );
            }
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        app.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Start the web server
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        let app = self.router();

        println!(
            "{}",
            format!("🌐 SageChat proxy listening on http://{}", addr)
                .bright_cyan()
                .bold()
        );
        println!("{}", format!("   Chat endpoint: http://{}/api/chat", addr).bright_black());
        println!("{}", format!("   Model: {}", self.state.llm.model()).bright_black());

        axum::serve(listener, app).await?;

        Ok(())
    }
}
