//! Session Management
//!
//! Owns every active conversation. Each caller gets exactly one
//! `ConversationState`, guarded by its own async mutex so that turns for
//! the same caller serialize while turns for different callers proceed
//! independently. The outer map lock is a short synchronous critical
//! section and is never held across an await point.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};

use call_agent_core::Message;

/// Conversation state for one caller
///
/// The history is append-only: messages are never reordered or truncated
/// while the session lives, which is why there is no removal surface here.
#[derive(Debug)]
pub struct ConversationState {
    history: Vec<Message>,
    no_input_streak: u32,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl ConversationState {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            history: Vec::new(),
            no_input_streak: 0,
            created_at: now,
            last_activity: now,
        }
    }

    /// Ordered transcript so far
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Clone the transcript for hand-off to persistence
    pub fn snapshot(&self) -> Vec<Message> {
        self.history.clone()
    }

    /// Consecutive no-input turns
    pub fn no_input_streak(&self) -> u32 {
        self.no_input_streak
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Append a user message
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(Message::user(content));
        self.touch();
    }

    /// Append an assistant message
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(Message::assistant(content));
        self.touch();
    }

    /// Record a no-input turn, returning the new streak
    pub fn record_no_input(&mut self) -> u32 {
        self.no_input_streak += 1;
        self.touch();
        self.no_input_streak
    }

    /// Reset the no-input streak; any usable input clears it
    pub fn clear_streak(&mut self) {
        self.no_input_streak = 0;
        self.touch();
    }

    /// Update last activity
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

type SessionSlot = Arc<Mutex<ConversationState>>;

/// Exclusively-locked handle to one caller's session
pub type SessionGuard = OwnedMutexGuard<ConversationState>;

/// Concurrency-safe map from caller id to conversation state
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionSlot>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the caller's session, creating it on first contact.
    ///
    /// Suspends until any racing turn for the same caller releases its
    /// guard. If the session is torn down while this turn waits, the
    /// acquisition retries against the freshly created slot so a removed
    /// session is never mutated.
    pub async fn acquire(&self, caller_id: &str) -> SessionGuard {
        loop {
            let slot = self.slot(caller_id);
            let guard = slot.clone().lock_owned().await;

            let still_current = self
                .sessions
                .read()
                .get(caller_id)
                .map(|s| Arc::ptr_eq(s, &slot))
                .unwrap_or(false);

            if still_current {
                return guard;
            }
        }
    }

    /// Remove a session; used on the terminal transition.
    ///
    /// Safe while a guard for the session is still held: the holder keeps
    /// its exclusive access until drop, and the next acquisition for this
    /// caller starts from a fresh state.
    pub fn remove(&self, caller_id: &str) {
        if self.sessions.write().remove(caller_id).is_some() {
            tracing::info!(caller_id = %caller_id, "Removed session");
        }
    }

    /// Number of active sessions
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Is there an active session for this caller?
    pub fn contains(&self, caller_id: &str) -> bool {
        self.sessions.read().contains_key(caller_id)
    }

    /// List all active caller ids
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    fn slot(&self, caller_id: &str) -> SessionSlot {
        if let Some(slot) = self.sessions.read().get(caller_id) {
            return slot.clone();
        }

        let mut sessions = self.sessions.write();
        sessions
            .entry(caller_id.to_string())
            .or_insert_with(|| {
                tracing::info!(caller_id = %caller_id, "Created session");
                Arc::new(Mutex::new(ConversationState::new()))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_creation() {
        let store = SessionStore::new();
        assert_eq!(store.count(), 0);

        let session = store.acquire("+15550001111").await;
        assert!(session.history().is_empty());
        assert_eq!(session.no_input_streak(), 0);
        drop(session);

        assert_eq!(store.count(), 1);
        assert!(store.contains("+15550001111"));
    }

    #[tokio::test]
    async fn test_state_survives_release() {
        let store = SessionStore::new();

        {
            let mut session = store.acquire("caller").await;
            session.push_user("hi");
            session.push_assistant("hello");
        }

        let session = store.acquire("caller").await;
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_creates_fresh_state() {
        let store = SessionStore::new();

        {
            let mut session = store.acquire("caller").await;
            session.push_user("hi");
            session.record_no_input();
        }

        store.remove("caller");
        assert!(!store.contains("caller"));

        let session = store.acquire("caller").await;
        assert!(session.history().is_empty());
        assert_eq!(session.no_input_streak(), 0);
    }

    #[tokio::test]
    async fn test_remove_while_guard_held() {
        let store = SessionStore::new();

        let mut session = store.acquire("caller").await;
        session.push_user("last words");
        store.remove("caller");

        // The holder keeps exclusive access until drop.
        assert_eq!(session.history().len(), 1);
        drop(session);

        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_same_caller_turns_serialize() {
        let store = Arc::new(SessionStore::new());

        let a = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut session = store.acquire("caller").await;
                session.push_user("first");
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                session.push_assistant("first reply");
            })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut session = store.acquire("caller").await;
                session.push_user("second");
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                session.push_assistant("second reply");
            })
        };

        a.await.unwrap();
        b.await.unwrap();

        // Whichever turn won the lock, each user/assistant pair must be
        // adjacent: the two turns may not interleave.
        let session = store.acquire("caller").await;
        let contents: Vec<&str> = session.history().iter().map(|m| m.content.as_str()).collect();
        assert!(
            contents == ["first", "first reply", "second", "second reply"]
                || contents == ["second", "second reply", "first", "first reply"],
            "interleaved history: {:?}",
            contents
        );
    }

    #[tokio::test]
    async fn test_different_callers_do_not_contend() {
        let store = Arc::new(SessionStore::new());

        // Holding one caller's lock must not block another caller's turn.
        let _held = store.acquire("caller-a").await;

        let other = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            store.acquire("caller-b"),
        )
        .await;
        assert!(other.is_ok(), "cross-caller lock contention");
    }
}
