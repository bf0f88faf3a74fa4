//! Configuration loading for Juris.
//! Reads juris.toml from the current directory or the path in JURIS_CONFIG.
//! Every section is optional; missing fields fall back to the defaults below.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use juris_llm::model::MODEL_PLACEHOLDER;

const DEFAULT_CONFIG_FILE: &str = "juris.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
    #[serde(default = "default_credentials")]
    pub credentials: Vec<CredentialConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            models: default_models(),
            credentials: default_credentials(),
            retry: RetryConfig::default(),
            probe: ProbeConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

// ── [server] ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16    { 3000 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

// ── [[models]] ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default = "default_endpoint_template")]
    pub endpoint_template: String,
    pub priority: u32,
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub description: String,
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_endpoint_template() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent".to_string()
}
fn default_model_timeout() -> u64 { 30 }

fn default_models() -> Vec<ModelConfig> {
    let model = |name: &str, priority, timeout_secs, description: &str| ModelConfig {
        name: name.to_string(),
        endpoint_template: default_endpoint_template(),
        priority,
        timeout_secs,
        description: description.to_string(),
    };
    vec![
        model("gemini-2.0-flash", 1, 30, "Fast general-purpose model, tried first"),
        model("gemini-1.5-flash", 2, 30, "Previous-generation fast model"),
        model("gemini-1.5-pro", 3, 45, "Larger model, slower but more thorough"),
    ]
}

// ── [[credentials]] ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Environment variable holding the API key.
    pub env_var: String,
    pub display_name: String,
    pub priority: u32,
}

fn default_credentials() -> Vec<CredentialConfig> {
    let cred = |env_var: &str, display_name: &str, priority| CredentialConfig {
        env_var: env_var.to_string(),
        display_name: display_name.to_string(),
        priority,
    };
    vec![
        cred("GEMINI_API_KEY", "Primary", 1),
        cred("GEMINI_API_KEY_2", "Secondary", 2),
        cred("GEMINI_API_KEY_3", "Tertiary", 3),
    ]
}

/// A credential whose secret was found in the environment.
#[derive(Debug)]
pub struct ResolvedCredential {
    pub id: String,
    pub display_name: String,
    pub priority: u32,
    pub secret: SecretString,
}

// ── [retry] ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries_per_pair: u32,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_min_answer_chars")]
    pub min_answer_chars: usize,
}

fn default_max_retries()      -> u32   { 2 }
fn default_base_backoff_ms()  -> u64   { 2_000 }
fn default_min_answer_chars() -> usize { 50 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries_per_pair: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            min_answer_chars: default_min_answer_chars(),
        }
    }
}

impl RetryConfig {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }
}

// ── [probe] ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_listing_endpoint")]
    pub listing_endpoint: String,
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

fn default_listing_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}
fn default_probe_timeout() -> u64 { 10 }

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            listing_endpoint: default_listing_endpoint(),
            timeout_secs: default_probe_timeout(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── [query] ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_max_query_chars")]
    pub max_chars: usize,
}

fn default_max_query_chars() -> usize { 2_000 }

impl Default for QueryConfig {
    fn default() -> Self {
        Self { max_chars: default_max_query_chars() }
    }
}


impl Config {
    /// Load configuration from juris.toml.
    /// Checks JURIS_CONFIG env var first, then the current directory.
    /// Only an absent ./juris.toml falls back to built-in defaults; a path
    /// named in JURIS_CONFIG must exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(std::env::var("JURIS_CONFIG").ok())
    }

    fn load_with(explicit: Option<String>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if !Path::new(DEFAULT_CONFIG_FILE).exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::Invalid("at least one model must be configured".into()));
        }
        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate model name '{}'", model.name)));
            }
            if model.timeout_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "model '{}' must have a timeout greater than zero",
                    model.name
                )));
            }
            if !model.endpoint_template.contains(MODEL_PLACEHOLDER) {
                return Err(ConfigError::Invalid(format!(
                    "endpoint template for '{}' is missing the {MODEL_PLACEHOLDER} placeholder",
                    model.name
                )));
            }
        }
        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::Invalid("probe timeout must be greater than zero".into()));
        }
        if self.query.max_chars == 0 {
            return Err(ConfigError::Invalid("query.max_chars must be greater than zero".into()));
        }
        Ok(())
    }

    /// Resolve credential secrets from the process environment.
    pub fn resolve_credentials(&self) -> Vec<ResolvedCredential> {
        self.resolve_credentials_with(|name| std::env::var(name).ok())
    }

    /// Credentials whose variable is unset or blank are silently dropped.
    pub fn resolve_credentials_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Vec<ResolvedCredential> {
        self.credentials
            .iter()
            .filter_map(|c| {
                let secret = lookup(&c.env_var)?;
                let secret = secret.trim();
                if secret.is_empty() {
                    return None;
                }
                Some(ResolvedCredential {
                    id: c.env_var.clone(),
                    display_name: c.display_name.clone(),
                    priority: c.priority,
                    secret: SecretString::from(secret.to_string()),
                })
            })
            .collect()
    }
}
