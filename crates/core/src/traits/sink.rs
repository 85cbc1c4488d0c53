//! Transcript persistence trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::message::Message;

/// Durably records a caller's transcript.
///
/// `upsert` is idempotent: repeated calls for the same caller overwrite the
/// stored transcript. Implementations are invoked fire-and-forget off the
/// caller-facing path; a failure is logged by the dispatcher and never
/// reaches the live call.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    /// Overwrite the stored transcript for a caller
    async fn upsert(
        &self,
        caller_id: &str,
        history: &[Message],
        recorded_at: DateTime<Utc>,
    ) -> Result<()>;
}
