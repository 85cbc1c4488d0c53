//! Call Agent Turn Engine
//!
//! The per-caller conversation state machine and its concurrency-safe
//! session store:
//! - Session lifecycle with per-caller mutual exclusion
//! - Pure turn policy (speech / no-input / termination)
//! - Turn orchestration with reply generation and fallback handling
//! - Fire-and-forget transcript persistence hand-off

pub mod handler;
pub mod persist;
pub mod policy;
pub mod session;

pub use handler::CallHandler;
pub use persist::{PersistJob, TranscriptWriter};
pub use policy::{TurnAction, TurnPolicy};
pub use session::{ConversationState, SessionGuard, SessionStore};

use thiserror::Error;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The inbound event carried no caller identity; no session is resolvable
    #[error("Inbound event is missing a caller id")]
    MissingCallerId,

    #[error("Session error: {0}")]
    Session(String),

    #[error("Reply generation error: {0}")]
    Generation(String),
}

impl From<call_agent_core::Error> for EngineError {
    fn from(err: call_agent_core::Error) -> Self {
        EngineError::Generation(err.to_string())
    }
}
