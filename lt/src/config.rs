//! lifetrack configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors found while validating configuration at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{service} API key not found. Set the {env_var} environment variable.")]
    MissingCredential { service: String, env_var: String },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Main lifetrack configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coach (chat completion) gateway configuration
    pub coach: CoachConfig,

    /// Speech (transcription + synthesis) gateway configuration
    pub speech: SpeechConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that every credential is available and values are sane.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.coach.resolve()?;
        self.speech.resolve()?;
        self.server.socket_addr()?;
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .lifetrack.yml
        let local_config = PathBuf::from(".lifetrack.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/lifetrack/lifetrack.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("lifetrack").join("lifetrack.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are ignored here; `load` reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Look up a credential in the process environment
fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn require_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field: field.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn require_url(field: &str, value: &str) -> Result<(), ConfigError> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            field: field.to_string(),
            reason: format!("'{}' is not an http(s) URL", value),
        });
    }
    Ok(())
}

/// Coach gateway configuration (any OpenAI-compatible chat completions API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (the client appends /v1/chat/completions)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient upstream failures (0 disables)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Initial backoff between retries in milliseconds (doubles per attempt)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            model: "llama3-70b-8192".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            base_url: "https://api.groq.com/openai".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout_ms: 30_000,
            max_retries: 2,
            retry_backoff_ms: 1000,
        }
    }
}

impl CoachConfig {
    /// Resolve the credential from the environment and validate values
    pub fn resolve(&self) -> Result<ResolvedCoachConfig, ConfigError> {
        self.resolve_with(env_lookup)
    }

    /// Resolve using a custom credential lookup
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<ResolvedCoachConfig, ConfigError> {
        require_url("coach.base-url", &self.base_url)?;
        require_positive("coach.timeout-ms", self.timeout_ms)?;
        require_positive("coach.max-tokens", u64::from(self.max_tokens))?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                field: "coach.temperature".to_string(),
                reason: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "coach.model".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let api_key = lookup(&self.api_key_env).ok_or_else(|| ConfigError::MissingCredential {
            service: "Coach".to_string(),
            env_var: self.api_key_env.clone(),
        })?;

        Ok(ResolvedCoachConfig {
            model: self.model.clone(),
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
            max_retries: self.max_retries,
            retry_backoff_ms: self.retry_backoff_ms,
        })
    }
}

/// Coach configuration with the credential materialized
#[derive(Clone)]
pub struct ResolvedCoachConfig {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl ResolvedCoachConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl std::fmt::Debug for ResolvedCoachConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCoachConfig")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Speech gateway configuration (Hugging Face style inference API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (the client appends /models/{model})
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Speech-to-text model identifier
    #[serde(rename = "transcription-model")]
    pub transcription_model: String,

    /// Text-to-speech model identifier
    #[serde(rename = "synthesis-model")]
    pub synthesis_model: String,

    /// Content-Type sent with raw audio uploads
    #[serde(rename = "audio-content-type")]
    pub audio_content_type: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// CLI retries when the model is cold-starting (503)
    #[serde(rename = "cold-start-retries")]
    pub cold_start_retries: u32,

    /// Upper bound on a single cold-start wait in milliseconds
    #[serde(rename = "max-cold-start-wait-ms")]
    pub max_cold_start_wait_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key_env: "HUGGING_FACE_API_KEY".to_string(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            transcription_model: "openai/whisper-large-v3".to_string(),
            synthesis_model: "facebook/mms-tts-eng".to_string(),
            audio_content_type: "audio/wav".to_string(),
            timeout_ms: 30_000,
            cold_start_retries: 3,
            max_cold_start_wait_ms: 60_000,
        }
    }
}

impl SpeechConfig {
    /// Resolve the credential from the environment and validate values
    pub fn resolve(&self) -> Result<ResolvedSpeechConfig, ConfigError> {
        self.resolve_with(env_lookup)
    }

    /// Resolve using a custom credential lookup
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<ResolvedSpeechConfig, ConfigError> {
        require_url("speech.base-url", &self.base_url)?;
        require_positive("speech.timeout-ms", self.timeout_ms)?;
        if !self.audio_content_type.starts_with("audio/") {
            return Err(ConfigError::Invalid {
                field: "speech.audio-content-type".to_string(),
                reason: format!("'{}' is not an audio MIME type", self.audio_content_type),
            });
        }

        let api_key = lookup(&self.api_key_env).ok_or_else(|| ConfigError::MissingCredential {
            service: "Speech".to_string(),
            env_var: self.api_key_env.clone(),
        })?;

        Ok(ResolvedSpeechConfig {
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            transcription_model: self.transcription_model.clone(),
            synthesis_model: self.synthesis_model.clone(),
            audio_content_type: self.audio_content_type.clone(),
            timeout_ms: self.timeout_ms,
            cold_start_retries: self.cold_start_retries,
            max_cold_start_wait_ms: self.max_cold_start_wait_ms,
        })
    }
}

/// Speech configuration with the credential materialized
#[derive(Clone)]
pub struct ResolvedSpeechConfig {
    pub api_key: String,
    pub base_url: String,
    pub transcription_model: String,
    pub synthesis_model: String,
    pub audio_content_type: String,
    pub timeout_ms: u64,
    pub cold_start_retries: u32,
    pub max_cold_start_wait_ms: u64,
}

impl ResolvedSpeechConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn max_cold_start_wait(&self) -> Duration {
        Duration::from_millis(self.max_cold_start_wait_ms)
    }
}

impl std::fmt::Debug for ResolvedSpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSpeechConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("transcription_model", &self.transcription_model)
            .field("synthesis_model", &self.synthesis_model)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. 127.0.0.1:8888
    pub bind: String,

    /// Maximum accepted request body in bytes
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8888".to_string(),
            max_body_bytes: 25 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|e| ConfigError::Invalid {
            field: "server.bind".to_string(),
            reason: format!("'{}': {}", self.bind, e),
        })
    }
}
