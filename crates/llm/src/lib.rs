//! Reply generation for the call agent
//!
//! Implements the `ReplyGenerator` trait over an OpenAI-compatible chat
//! completion API.

pub mod openai;

pub use openai::OpenAiReplyGenerator;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Empty completion")]
    EmptyCompletion,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<LlmError> for call_agent_core::Error {
    fn from(e: LlmError) -> Self {
        call_agent_core::Error::Llm(e.to_string())
    }
}
