//! Configuration for the call agent
//!
//! Settings are layered: `config/default` file, then an optional
//! environment-specific file, then `CALL_AGENT`-prefixed environment
//! variables.

pub mod settings;

pub use settings::{
    load_settings, AuthConfig, EngineConfig, LlmConfig, ObservabilityConfig, PersistenceConfig,
    ServerConfig, Settings, VoiceConfig,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
