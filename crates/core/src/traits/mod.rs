//! Collaborator traits for the call agent
//!
//! The engine owns no external service state; everything that crosses a
//! process boundary sits behind one of these traits so implementations can
//! be swapped without touching the turn logic, and tests can run against
//! mocks.

mod auth;
mod reply;
mod sink;

pub use auth::{RequestAuthenticator, RequestMetadata};
pub use reply::ReplyGenerator;
pub use sink::TranscriptSink;
