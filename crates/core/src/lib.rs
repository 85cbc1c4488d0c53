//! Core types and traits for the call agent
//!
//! This crate provides the foundational types used across all other crates:
//! - Conversation messages and roles
//! - Turn events and outbound instructions
//! - Transcript sanitization
//! - Error types
//! - Collaborator traits (reply generation, transcript persistence, request
//!   authentication)

pub mod error;
pub mod event;
pub mod message;
pub mod text;
pub mod traits;

pub use error::{Error, Result};
pub use event::{OutboundInstruction, TurnEvent};
pub use message::{Message, Role};
pub use text::sanitize_transcript;
pub use traits::{ReplyGenerator, RequestAuthenticator, RequestMetadata, TranscriptSink};
