//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Turn engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Reply generation configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Transcript persistence configuration
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.no_input_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.no_input_threshold".to_string(),
                message: "Threshold must be at least 1".to_string(),
            });
        }

        if self.engine.reply_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.reply_timeout_ms".to_string(),
                message: "Reply timeout must be non-zero".to_string(),
            });
        }

        if self.engine.persist_queue_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.persist_queue_depth".to_string(),
                message: "Persistence queue depth must be non-zero".to_string(),
            });
        }

        if self.server.auth.enabled && self.server.auth.auth_token.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "server.auth.auth_token".to_string(),
                message: "Auth is enabled but no token is configured".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Webhook authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Voice prompt rendering configuration
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: default_true(),
            auth: AuthConfig::default(),
            voice: VoiceConfig::default(),
        }
    }
}

/// Webhook authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Enable signature verification (set to false for development)
    #[serde(default)]
    pub enabled: bool,

    /// Shared token the provider signs requests with
    /// (set via CALL_AGENT__SERVER__AUTH__AUTH_TOKEN env var)
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Allow unsigned requests from loopback addresses
    #[serde(default = "default_true")]
    pub allow_loopback: bool,

    /// Paths that bypass authentication (e.g., health checks)
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/ready".to_string()]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            auth_token: None,
            allow_loopback: default_true(),
            public_paths: default_public_paths(),
        }
    }
}

/// Voice prompt rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Seconds to wait for speech before a no-input turn
    #[serde(default = "default_gather_timeout")]
    pub gather_timeout_seconds: u32,

    /// Spoken language tag
    #[serde(default = "default_language")]
    pub language: String,

    /// Synthesis voice name
    #[serde(default = "default_voice")]
    pub voice: String,
}

fn default_gather_timeout() -> u32 {
    5
}
fn default_language() -> String {
    "en-US".to_string()
}
fn default_voice() -> String {
    "alice".to_string()
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            gather_timeout_seconds: default_gather_timeout(),
            language: default_language(),
            voice: default_voice(),
        }
    }
}

/// Turn engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Consecutive no-input turns before the call is terminated
    #[serde(default = "default_no_input_threshold")]
    pub no_input_threshold: u32,

    /// Budget for one reply generation call, in milliseconds
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,

    /// Capacity of the transcript write queue
    #[serde(default = "default_persist_queue_depth")]
    pub persist_queue_depth: usize,

    /// Spoken when a call starts
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Spoken after a no-input turn below the threshold
    #[serde(default = "default_reprompt")]
    pub reprompt: String,

    /// Spoken before hanging up on the terminal no-input turn
    #[serde(default = "default_farewell")]
    pub farewell: String,

    /// Spoken when reply generation fails; the call continues
    #[serde(default = "default_apology")]
    pub apology: String,
}

fn default_no_input_threshold() -> u32 {
    2
}
fn default_reply_timeout_ms() -> u64 {
    10_000
}
fn default_persist_queue_depth() -> usize {
    64
}
fn default_greeting() -> String {
    "Hello! How can I assist you today?".to_string()
}
fn default_reprompt() -> String {
    "I'm sorry, I didn't catch that. Could you please repeat?".to_string()
}
fn default_farewell() -> String {
    "It seems we're having trouble connecting. Please call back later.".to_string()
}
fn default_apology() -> String {
    "I'm sorry, I'm having trouble processing your request right now.".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            no_input_threshold: default_no_input_threshold(),
            reply_timeout_ms: default_reply_timeout_ms(),
            persist_queue_depth: default_persist_queue_depth(),
            greeting: default_greeting(),
            reprompt: default_reprompt(),
            farewell: default_farewell(),
            apology: default_apology(),
        }
    }
}

/// Reply generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u16,

    /// API key (set via CALL_AGENT__LLM__API_KEY or OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override the API base URL (for OpenAI-compatible gateways)
    #[serde(default)]
    pub api_base: Option<String>,

    /// Optional persona prompt prepended to every generation call
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u16 {
    100
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
            api_base: None,
            system_prompt: None,
        }
    }
}

/// Transcript persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable the durable store; when false an in-memory sink is used
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// ScyllaDB contact points
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Keyspace name
    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    /// Keyspace replication factor
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_hosts() -> Vec<String> {
    vec!["127.0.0.1:9042".to_string()]
}
fn default_keyspace() -> String {
    "call_agent".to_string()
}
fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            hosts: default_hosts(),
            keyspace: default_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (CALL_AGENT prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("CALL_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.engine.no_input_threshold, 2);
        assert_eq!(settings.llm.model, "gpt-3.5-turbo");
        assert_eq!(settings.persistence.keyspace, "call_agent");
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.engine.no_input_threshold = 0;
        assert!(settings.validate().is_err());

        settings.engine.no_input_threshold = 2;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_auth_requires_token() {
        let mut settings = Settings::default();
        settings.server.auth.enabled = true;
        assert!(settings.validate().is_err());

        settings.server.auth.auth_token = Some("secret".to_string());
        assert!(settings.validate().is_ok());
    }
}
