//! Transcript persistence hand-off
//!
//! Durable writes never sit on the caller-facing path: the handler takes a
//! snapshot of the history under the session lock, then schedules it onto a
//! bounded channel after the lock is released. A single writer task drains
//! the channel and calls the sink; sink failures are logged and absorbed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use call_agent_core::{Message, TranscriptSink};

/// One scheduled transcript write
#[derive(Debug, Clone)]
pub struct PersistJob {
    pub caller_id: String,
    pub history: Vec<Message>,
    pub recorded_at: DateTime<Utc>,
}

/// Clonable scheduling handle over the write queue
#[derive(Clone)]
pub struct TranscriptWriter {
    tx: mpsc::Sender<PersistJob>,
}

impl TranscriptWriter {
    /// Spawn the writer task and return its scheduling handle.
    ///
    /// The task runs until every handle is dropped and the queue drains,
    /// so writes dispatched by an aborted turn still complete.
    pub fn spawn(sink: Arc<dyn TranscriptSink>, queue_depth: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<PersistJob>(queue_depth);

        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = sink
                    .upsert(&job.caller_id, &job.history, job.recorded_at)
                    .await
                {
                    tracing::error!(
                        caller_id = %job.caller_id,
                        error = %e,
                        "Failed to persist transcript"
                    );
                } else {
                    tracing::debug!(
                        caller_id = %job.caller_id,
                        turns = job.history.len(),
                        "Transcript persisted"
                    );
                }
            }
        });

        (Self { tx }, handle)
    }

    /// Schedule a transcript write without blocking.
    ///
    /// A full queue drops the job: the next mutating turn for the caller
    /// re-sends the whole transcript, and a slow sink must never stall the
    /// live audio turnaround.
    pub fn schedule(&self, caller_id: &str, history: Vec<Message>) {
        let job = PersistJob {
            caller_id: caller_id.to_string(),
            history,
            recorded_at: Utc::now(),
        };

        if let Err(e) = self.tx.try_send(job) {
            tracing::warn!(caller_id = %caller_id, error = %e, "Transcript write queue full, dropping snapshot");
        }
    }
}
