//! Configuration for the content store client.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CONTENTSTORE_SERVER_URL, CONTENTSTORE_SERVER_MODE,
//!    CONTENTSTORE_AUTH_TOKEN)
//! 2. Config file (.contentstore/config.yaml)
//! 3. Defaults (local server, 30s timeout)
//!
//! Config file discovery:
//! - Searches current directory and parents for .contentstore/config.yaml
//! - Falls back to the user config directory (contentstore/config.yaml)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Which backend deployment to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    #[default]
    Local,
    Beta,
    Production,
}

impl ServerMode {
    /// Base URL of the deployment
    pub fn base_url(&self) -> &'static str {
        match self {
            ServerMode::Local => "http://127.0.0.1:3000",
            ServerMode::Beta => "https://beta.oddworks.io",
            ServerMode::Production => "https://device.oddworks.io",
        }
    }
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMode::Local => write!(f, "local"),
            ServerMode::Beta => write!(f, "beta"),
            ServerMode::Production => write!(f, "production"),
        }
    }
}

impl FromStr for ServerMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ServerMode::Local),
            "beta" | "staging" => Ok(ServerMode::Beta),
            "production" | "prod" => Ok(ServerMode::Production),
            _ => anyhow::bail!("Unknown server mode: {}", s),
        }
    }
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Named deployment
    pub mode: Option<ServerMode>,
    /// Explicit base URL (wins over `mode`)
    pub url: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub server_mode: ServerMode,
    /// API base URL
    pub base_url: String,
    /// Device access token
    pub auth_token: Option<String>,
    /// Transport timeout
    pub timeout: Duration,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: Option<String>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(".contentstore").join("config.yaml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("contentstore").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge a config file and environment lookups into a resolved config
fn resolve_config<E>(file: Option<(PathBuf, ConfigFile)>, env: E) -> Result<ResolvedConfig>
where
    E: Fn(&str) -> Option<String>,
{
    let (config_file, parsed) = match file {
        Some((path, parsed)) => (Some(path), Some(parsed)),
        None => (None, None),
    };

    let server_mode = match env("CONTENTSTORE_SERVER_MODE") {
        Some(mode) => mode.parse()?,
        None => parsed
            .as_ref()
            .and_then(|c| c.server.mode)
            .unwrap_or_default(),
    };

    let base_url = env("CONTENTSTORE_SERVER_URL")
        .or_else(|| parsed.as_ref().and_then(|c| c.server.url.clone()))
        .unwrap_or_else(|| server_mode.base_url().to_string());

    let auth_token = env("CONTENTSTORE_AUTH_TOKEN")
        .or_else(|| parsed.as_ref().and_then(|c| c.auth_token.clone()));

    let timeout_seconds = parsed
        .as_ref()
        .and_then(|c| c.timeout_seconds)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

    Ok(ResolvedConfig {
        server_mode,
        base_url,
        auth_token,
        timeout: Duration::from_secs(timeout_seconds),
        log_level: parsed.and_then(|c| c.log_level),
        config_file,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let file = match find_config_file() {
        Some(path) => {
            let parsed = load_config_file(&path)?;
            Some((path, parsed))
        }
        None => None,
    };

    resolve_config(file, |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
