use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DEFAULT_DATA_DIR, DEFAULT_ENDPOINT};

/// CLI arguments for sagechat
#[derive(Parser, Debug)]
#[command(name = "sagechat")]
#[command(about = "SageChat - a beginner-friendly DeepSeek chat proxy and terminal client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the chat proxy server
    Serve(ServeArgs),
    /// Chat in the terminal through a running proxy
    Chat(ChatArgs),
    /// List saved chat histories
    List(DataDirArgs),
    /// Write a chat history transcript to a file
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Web server bind address
    #[arg(long, default_value = "127.0.0.1", env = "SAGECHAT_BIND")]
    pub bind: String,

    /// Web server port
    #[arg(long, default_value = "3000", env = "SAGECHAT_PORT")]
    pub port: u16,

    /// Optional TOML file with model, sampling and prompt overrides
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory of static frontend files served at /
    #[arg(long, value_name = "DIR")]
    pub web_dir: Option<PathBuf>,

    /// Override the provider model name
    #[arg(long, value_name = "MODEL", env = "SAGECHAT_MODEL")]
    pub model: Option<String>,

    /// Provider API base URL (e.g., https://api.deepseek.com/v1)
    #[arg(long, value_name = "URL", env = "DEEPSEEK_BASE_URL")]
    pub base_url: Option<String>,

    /// Provider API key
    #[arg(long, value_name = "KEY", env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DataDirArgs {
    /// Directory holding saved chat histories
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_DIR, env = "SAGECHAT_DATA_DIR")]
    pub data_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Base URL of a running sagechat proxy
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT, env = "SAGECHAT_ENDPOINT")]
    pub endpoint: String,

    #[command(flatten)]
    pub data: DataDirArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Id of the chat history to export
    pub id: String,

    /// Output file (defaults to "<title>.txt" in the current directory)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub data: DataDirArgs,
}

impl Cli {
    /// Default tracing filter when RUST_LOG is unset
    pub fn default_log_level(&self) -> &'static str {
        match (&self.command, self.verbose) {
            (_, true) => "debug",
            // Keep the prompt readable in the terminal client
            (Commands::Chat(_), false) => "warn",
            _ => "info",
        }
    }
}
