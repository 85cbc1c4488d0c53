//! Reply generation trait

use async_trait::async_trait;

use crate::error::Result;
use crate::message::Message;

/// Turns a message history into the next assistant message.
///
/// Implementations are stateless across calls: the full ordered history is
/// supplied every time. The caller bounds each call with a timeout and
/// treats a timeout the same as any other generation failure.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate the next assistant message for the given history
    async fn generate(&self, history: &[Message]) -> Result<Message>;
}
