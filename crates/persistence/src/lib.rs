//! Durable transcript storage for the call agent
//!
//! Provides the `TranscriptSink` implementations:
//! - ScyllaDB-backed store for production
//! - In-memory store for tests and local runs without a database

pub mod client;
pub mod conversations;
pub mod error;
pub mod schema;

pub use client::{ScyllaClient, ScyllaConfig};
pub use conversations::{MemoryTranscriptStore, ScyllaTranscriptStore, TranscriptRecord};
pub use error::PersistenceError;

/// Connect to ScyllaDB and ensure the schema exists
pub async fn init(config: ScyllaConfig) -> Result<ScyllaTranscriptStore, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(ScyllaTranscriptStore::new(client))
}
