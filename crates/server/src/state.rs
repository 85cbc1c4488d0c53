//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use call_agent_config::Settings;
use call_agent_engine::CallHandler;

use crate::auth::SignatureAuthenticator;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Turn orchestrator
    pub handler: Arc<CallHandler>,
    /// Webhook gate
    pub authenticator: Arc<SignatureAuthenticator>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Settings, handler: Arc<CallHandler>) -> Self {
        let authenticator = Arc::new(SignatureAuthenticator::new(&config.server.auth));
        Self {
            config: Arc::new(config),
            handler,
            authenticator,
        }
    }
}
