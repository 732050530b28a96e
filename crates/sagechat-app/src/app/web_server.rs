use anyhow::Result;
use colored::Colorize;
use sagechat_llm_api::ClientFactory;
use tracing::info;

use crate::cli::ServeArgs;
use crate::config::ServerConfig;
use crate::web::{AppState, WebServer, WebServerConfig};

/// Run the chat proxy
pub async fn run_web_server(args: &ServeArgs) -> Result<()> {
    let config = ServerConfig::resolve(args)?;

    println!("{}", "🚀 Starting SageChat proxy...".bright_cyan().bold());
    println!("   Address: {}", config.bind_addr);
    if let Some(web_dir) = &config.web_dir {
        println!("   Web directory: {}", web_dir.display());
    }
    info!(
        model = %config.provider.model,
        base_url = %config.provider.base_url,
        "resolved proxy configuration"
    );

    let llm = ClientFactory::create(config.provider)?;
    let state = AppState::new(llm, config.system_prompt);

    let server = WebServer::new(
        WebServerConfig {
            bind_addr: config.bind_addr,
            web_dir: config.web_dir,
        },
        state,
    );
    server.start().await?;

    Ok(())
}
