//! Configuration from environment variables and chatbridge.yml.
//!
//! **Environment variables:**
//! - `HOST`: bind address (default: 0.0.0.0)
//! - `PORT`: server port (default: 8787)
//! - `CLAUDE_BASE_URL`: Anthropic API base URL (default: https://api.anthropic.com)
//! - `CLAUDE_API_KEY`: key used when a request carries none (default: unset)
//! - `MAX_TOKENS`: `max_tokens` sent with every request (default: 4096)
//! - `ANTHROPIC_VERSION`: `anthropic-version` header (default: 2023-06-01)
//! - `REQUEST_TIMEOUT_SECS`: upstream connect and idle-read timeout (default: 600)
//!
//! A YAML file overrides any of these field by field:
//!
//! ```yaml
//! port: 9000
//! backend_base_url: "https://api.anthropic.com"
//! api_key: "sk-ant-..."
//! max_tokens: 8192
//! ```

use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BACKEND_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;

const CONFIG_CANDIDATES: &[&str] = &["chatbridge.yml", "chatbridge.yaml"];

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub backend_base_url: String,
    pub default_api_key: Option<SecretString>,
    pub max_tokens: u32,
    pub anthropic_version: String,
    pub request_timeout_secs: u64,
}

/// On-disk configuration. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    backend_base_url: Option<String>,
    api_key: Option<String>,
    max_tokens: Option<u32>,
    anthropic_version: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

impl ProxyConfig {
    /// Build a config from an environment-like lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            backend_base_url: non_empty("CLAUDE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BACKEND_BASE_URL.to_string()),
            default_api_key: non_empty("CLAUDE_API_KEY").map(SecretString::from),
            max_tokens: non_empty("MAX_TOKENS")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
            anthropic_version: non_empty("ANTHROPIC_VERSION")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_VERSION.to_string()),
            request_timeout_secs: non_empty("REQUEST_TIMEOUT_SECS")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Load configuration: environment defaults, then the YAML file at
    /// `path` (which must exist) or the first discovered `chatbridge.yml`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => match find_config_file() {
                Some(found) => Self::from_yaml_file(found),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::default().merge_yaml(&content)
    }

    /// Apply YAML overrides on top of `self`.
    pub fn merge_yaml(self, content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map.
        if content.trim().is_empty() {
            return Ok(self);
        }
        let file: FileConfig =
            serde_yaml_ng::from_str(content).context("Failed to parse chatbridge.yml")?;
        self.with_file(file)
    }

    fn with_file(self, file: FileConfig) -> Result<Self> {
        if file.max_tokens == Some(0) {
            return Err(anyhow!("max_tokens must be greater than zero"));
        }

        Ok(Self {
            host: file.host.unwrap_or(self.host),
            port: file.port.unwrap_or(self.port),
            backend_base_url: file.backend_base_url.unwrap_or(self.backend_base_url),
            default_api_key: file
                .api_key
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from)
                .or(self.default_api_key),
            max_tokens: file.max_tokens.unwrap_or(self.max_tokens),
            anthropic_version: file.anthropic_version.unwrap_or(self.anthropic_version),
            request_timeout_secs: file
                .request_timeout_secs
                .unwrap_or(self.request_timeout_secs),
        })
    }

    pub fn backend_base_url_trimmed(&self) -> &str {
        self.backend_base_url.trim_end_matches('/')
    }

    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.backend_base_url_trimmed())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_CANDIDATES.iter().map(PathBuf::from);
    let home = dirs::home_dir()
        .map(|home| home.join(".config").join("chatbridge"))
        .into_iter()
        .flat_map(|dir| CONFIG_CANDIDATES.iter().map(move |c| dir.join(c)));

    local.chain(home).find(|path| path.exists())
}
