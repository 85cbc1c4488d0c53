//! Conversation transcript storage
//!
//! One row per caller: repeated upserts overwrite the stored transcript,
//! which is exactly the sink contract the engine relies on.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use call_agent_core::{Message, TranscriptSink};

use crate::client::ScyllaClient;
use crate::error::PersistenceError;

/// Stored transcript for one caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub caller_id: String,
    pub history: Vec<Message>,
    pub updated_at: DateTime<Utc>,
}

impl TranscriptRecord {
    pub fn turn_count(&self) -> usize {
        self.history.len()
    }
}

/// ScyllaDB-backed transcript store
#[derive(Clone)]
pub struct ScyllaTranscriptStore {
    client: ScyllaClient,
}

impl ScyllaTranscriptStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    async fn write(
        &self,
        caller_id: &str,
        history: &[Message],
        recorded_at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let transcript_json = serde_json::to_string(history)?;

        let query = format!(
            "INSERT INTO {}.conversations (caller_id, transcript_json, turn_count, updated_at) \
             VALUES (?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query(
                query,
                (
                    caller_id,
                    transcript_json,
                    history.len() as i32,
                    recorded_at.timestamp_millis(),
                ),
            )
            .await?;

        tracing::debug!(caller_id = %caller_id, turns = history.len(), "Transcript upserted");
        Ok(())
    }

    /// Fetch the stored transcript for a caller
    pub async fn fetch(&self, caller_id: &str) -> Result<Option<TranscriptRecord>, PersistenceError> {
        let query = format!(
            "SELECT caller_id, transcript_json, updated_at FROM {}.conversations \
             WHERE caller_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query(query, (caller_id,))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (caller_id, transcript_json, updated_at): (String, String, i64) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

                let history: Vec<Message> = serde_json::from_str(&transcript_json)?;

                return Ok(Some(TranscriptRecord {
                    caller_id,
                    history,
                    updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
                }));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl TranscriptSink for ScyllaTranscriptStore {
    async fn upsert(
        &self,
        caller_id: &str,
        history: &[Message],
        recorded_at: DateTime<Utc>,
    ) -> call_agent_core::Result<()> {
        self.write(caller_id, history, recorded_at).await?;
        Ok(())
    }
}

/// In-memory transcript store for tests and database-less local runs
#[derive(Default)]
pub struct MemoryTranscriptStore {
    records: RwLock<HashMap<String, TranscriptRecord>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the stored transcript for a caller
    pub fn fetch(&self, caller_id: &str) -> Option<TranscriptRecord> {
        self.records.read().get(caller_id).cloned()
    }

    /// Number of stored transcripts
    pub fn count(&self) -> usize {
        self.records.read().len()
    }
}

#[async_trait]
impl TranscriptSink for MemoryTranscriptStore {
    async fn upsert(
        &self,
        caller_id: &str,
        history: &[Message],
        recorded_at: DateTime<Utc>,
    ) -> call_agent_core::Result<()> {
        self.records.write().insert(
            caller_id.to_string(),
            TranscriptRecord {
                caller_id: caller_id.to_string(),
                history: history.to_vec(),
                updated_at: recorded_at,
            },
        );
        Ok(())
    }
}
