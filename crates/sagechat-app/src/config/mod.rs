use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use sagechat_llm_api::{ProviderConfig, SamplingParams};
use serde::Deserialize;
use thiserror::Error;

use crate::cli::ServeArgs;

pub mod helpers;
pub use helpers::{
    get_system_prompt, transcript_path, DEFAULT_DATA_DIR, DEFAULT_ENDPOINT, DEFAULT_SYSTEM_PROMPT,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DEEPSEEK_API_KEY is not set; add it to the environment or a .env file")]
    MissingApiKey,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid bind address {0}")]
    BindAddr(String),
}

/// Optional TOML overrides for the proxy
///
/// ```toml
/// model = "deepseek-chat"
/// base_url = "https://api.deepseek.com/v1"
/// system_prompt = "..."
///
/// [sampling]
/// temperature = 0.7
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub system_prompt: Option<String>,
    pub sampling: Option<SamplingParams>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved proxy configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub provider: ProviderConfig,
    pub system_prompt: String,
    pub web_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Merge command line and environment with the optional config file.
    ///
    /// Flags and environment win over the file, the file wins over defaults.
    pub fn resolve(args: &ServeArgs) -> Result<Self, ConfigError> {
        let api_key = args
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let bind = format!("{}:{}", args.bind, args.port);
        let bind_addr: SocketAddr = bind.parse().map_err(|_| ConfigError::BindAddr(bind.clone()))?;

        let mut provider = ProviderConfig::new(api_key);
        if let Some(model) = args.model.clone().or(file.model) {
            provider.model = model;
        }
        if let Some(base_url) = args.base_url.clone().or(file.base_url) {
            provider.base_url = base_url;
        }
        if let Some(sampling) = file.sampling {
            provider.sampling = sampling;
        }

        Ok(Self {
            bind_addr,
            provider,
            system_prompt: get_system_prompt(file.system_prompt.as_deref()),
            web_dir: args.web_dir.clone(),
        })
    }
}
