//! FitCoach configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main FitCoach configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Backend (auth + records) configuration
    pub backend: BackendConfig,

    /// Local storage configuration
    pub storage: StorageConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables are set. Call this early in
    /// startup to fail fast with clear error messages. Offline mode skips the
    /// backend checks.
    pub fn validate(&self, offline: bool) -> Result<()> {
        let key_env = self.llm.api_key_env();
        if std::env::var(&key_env).is_err() {
            return Err(eyre::eyre!("LLM API key not found. Set the {} environment variable.", key_env));
        }
        if !offline {
            self.backend.url()?;
            self.backend.anon_key()?;
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are ignored here; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let paths = match config_path {
            Some(p) => vec![p.clone()],
            None => Self::default_paths(),
        };
        paths
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    /// Project-local config first, then the user config
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".fitcoach.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fitcoach").join("fitcoach.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "gemini", "openai" or "anthropic"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key (provider default if unset)
    #[serde(rename = "api-key-env")]
    pub api_key_env: Option<String>,

    /// API base URL (provider default if unset)
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Maximum tokens per plan/schedule response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Maximum tokens per chat reply
    #[serde(rename = "chat-max-tokens")]
    pub chat_max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Extra attempts after a transient provider failure; 0 sends each request once
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: None,
            base_url: None,
            max_tokens: 8192,
            chat_max_tokens: 500,
            timeout_ms: 120_000,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> String {
        if let Some(env) = &self.api_key_env {
            return env.clone();
        }
        match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            "anthropic" => "ANTHROPIC_API_KEY",
            _ => "GEMINI_API_KEY",
        }
        .to_string()
    }

    /// API base URL
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.provider.as_str() {
            "openai" => "https://api.openai.com",
            "anthropic" => "https://api.anthropic.com",
            _ => "https://generativelanguage.googleapis.com",
        }
        .to_string()
    }

    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        let env = self.api_key_env();
        debug!(%env, "LlmConfig::get_api_key: called");
        std::env::var(&env).map_err(|_| eyre::eyre!("LLM API key not found. Set the {} environment variable.", env))
    }
}

/// Backend (auth + records) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Environment variable containing the project URL
    #[serde(rename = "url-env")]
    pub url_env: String,

    /// Environment variable containing the anon (public) key
    #[serde(rename = "anon-key-env")]
    pub anon_key_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url_env: "SUPABASE_URL".to_string(),
            anon_key_env: "SUPABASE_ANON_KEY".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl BackendConfig {
    pub fn url(&self) -> Result<String> {
        std::env::var(&self.url_env)
            .map_err(|_| eyre::eyre!("Backend URL not found. Set the {} environment variable.", self.url_env))
    }

    pub fn anon_key(&self) -> Result<String> {
        std::env::var(&self.anon_key_env)
            .map_err(|_| eyre::eyre!("Backend key not found. Set the {} environment variable.", self.anon_key_env))
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the signed-in session is kept between runs
    #[serde(rename = "session-file")]
    pub session_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/fitcoach on Linux)
        let session_file = dirs::data_dir()
            .map(|d| d.join("fitcoach"))
            .unwrap_or_else(|| PathBuf::from(".fitcoach"))
            .join("session.json");

        Self { session_file }
    }
}
