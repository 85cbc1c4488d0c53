//! Keyspace and table definitions

use scylla::Session;

use crate::error::PersistenceError;

/// Create the keyspace if it does not exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = \
         {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session.query(query, ()).await?;
    Ok(())
}

/// Create the tables if they do not exist
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE TABLE IF NOT EXISTS {}.conversations (
            caller_id text PRIMARY KEY,
            transcript_json text,
            turn_count int,
            updated_at timestamp
        )",
        keyspace
    );

    session.query(query, ()).await?;
    Ok(())
}
