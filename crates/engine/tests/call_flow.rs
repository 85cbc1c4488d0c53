//! Integration tests for the call flow (webhook event -> instruction)
//!
//! These exercise the handler end to end against scripted collaborators:
//! turn ordering, no-input termination, generation failure recovery and
//! per-caller isolation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use call_agent_config::EngineConfig;
use call_agent_core::{Error, Message, ReplyGenerator, Result, Role, TranscriptSink};
use call_agent_engine::{CallHandler, EngineError, SessionStore, TranscriptWriter};

/// Echoes the last user message back, with an optional artificial delay
struct EchoGenerator {
    delay: Duration,
}

impl EchoGenerator {
    fn new() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ReplyGenerator for EchoGenerator {
    async fn generate(&self, history: &[Message]) -> Result<Message> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let last_user = history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .ok_or_else(|| Error::llm("no user message in history"))?;
        Ok(Message::assistant(format!("echo: {}", last_user.content)))
    }
}

/// Always fails
struct BrokenGenerator;

#[async_trait]
impl ReplyGenerator for BrokenGenerator {
    async fn generate(&self, _history: &[Message]) -> Result<Message> {
        Err(Error::llm("backend unavailable"))
    }
}

/// Never answers within any reasonable budget
struct StalledGenerator;

#[async_trait]
impl ReplyGenerator for StalledGenerator {
    async fn generate(&self, _history: &[Message]) -> Result<Message> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        unreachable!()
    }
}

/// Captures every upsert for assertions
#[derive(Default)]
struct RecordingSink {
    upserts: Mutex<Vec<(String, Vec<Message>)>>,
}

#[async_trait]
impl TranscriptSink for RecordingSink {
    async fn upsert(
        &self,
        caller_id: &str,
        history: &[Message],
        _recorded_at: DateTime<Utc>,
    ) -> Result<()> {
        self.upserts.lock().push((caller_id.to_string(), history.to_vec()));
        Ok(())
    }
}

fn handler_with(
    generator: Arc<dyn ReplyGenerator>,
    sink: Arc<RecordingSink>,
) -> (CallHandler, tokio::task::JoinHandle<()>) {
    let config = EngineConfig {
        reply_timeout_ms: 250,
        ..EngineConfig::default()
    };
    let (writer, writer_task) = TranscriptWriter::spawn(sink, config.persist_queue_depth);
    let handler = CallHandler::new(Arc::new(SessionStore::new()), generator, writer, config);
    (handler, writer_task)
}

#[tokio::test]
async fn test_call_start_greets_and_listens() {
    let (handler, _task) = handler_with(Arc::new(EchoGenerator::new()), Arc::default());

    let instruction = handler.on_call_start("+15550001111").await.unwrap();
    assert_eq!(instruction.utterance, "Hello! How can I assist you today?");
    assert!(instruction.continue_listening);
    assert!(!instruction.hang_up);
}

#[tokio::test]
async fn test_content_turns_alternate_and_double_history() {
    let (handler, _task) = handler_with(Arc::new(EchoGenerator::new()), Arc::default());
    let caller = "+15550001111";

    handler.on_call_start(caller).await.unwrap();

    let n = 3;
    for i in 0..n {
        let instruction = handler
            .on_turn(caller, Some(&format!("turn {}", i)))
            .await
            .unwrap();
        assert!(instruction.continue_listening);
        assert_eq!(instruction.utterance, format!("echo: turn {}", i));
    }

    // After N content-bearing turns the history holds 2N messages,
    // alternating user/assistant starting with the user.
    let session = handler.sessions().acquire(caller).await;
    assert_eq!(session.history().len(), 2 * n);
    for (i, message) in session.history().iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(message.role, expected, "position {}", i);
    }
}

#[tokio::test]
async fn test_transcript_is_sanitized_before_append() {
    let (handler, _task) = handler_with(Arc::new(EchoGenerator::new()), Arc::default());

    handler.on_turn("caller", Some("Hello, World! 123")).await.unwrap();

    let session = handler.sessions().acquire("caller").await;
    assert_eq!(session.history()[0].content, "Hello World 123");
}

#[tokio::test]
async fn test_no_input_reprompts_then_terminates() {
    let sink = Arc::new(RecordingSink::default());
    let (handler, _task) = handler_with(Arc::new(EchoGenerator::new()), sink.clone());
    let caller = "+15550001111";

    handler.on_call_start(caller).await.unwrap();
    handler.on_turn(caller, Some("hello")).await.unwrap();

    // Turn 1 without input: re-prompt, keep listening.
    let instruction = handler.on_turn(caller, None).await.unwrap();
    assert!(instruction.continue_listening);
    assert_eq!(
        instruction.utterance,
        "I'm sorry, I didn't catch that. Could you please repeat?"
    );

    // Turn 2 without input: terminal notice, hang up, session gone.
    let instruction = handler.on_turn(caller, None).await.unwrap();
    assert!(instruction.hang_up);
    assert_eq!(
        instruction.utterance,
        "It seems we're having trouble connecting. Please call back later."
    );
    assert!(!handler.sessions().contains(caller));

    // A later lookup starts from scratch.
    let session = handler.sessions().acquire(caller).await;
    assert!(session.history().is_empty());
    assert_eq!(session.no_input_streak(), 0);
}

#[tokio::test]
async fn test_terminal_turn_persists_transcript() {
    let sink = Arc::new(RecordingSink::default());
    let (handler, task) = handler_with(Arc::new(EchoGenerator::new()), sink.clone());
    let caller = "+15550001111";

    handler.on_turn(caller, Some("remember this")).await.unwrap();
    handler.on_turn(caller, None).await.unwrap();
    handler.on_turn(caller, None).await.unwrap();

    drop(handler);
    task.await.unwrap();

    let upserts = sink.upserts.lock();
    // One write for the content turn, one for the terminal turn; the
    // re-prompt turn adds no transcript delta and writes nothing.
    assert_eq!(upserts.len(), 2);
    let (last_caller, last_history) = &upserts[1];
    assert_eq!(last_caller, caller);
    assert_eq!(last_history.len(), 2);
    assert_eq!(last_history[0].content, "remember this");
}

#[tokio::test]
async fn test_generation_failure_keeps_conversation_alive() {
    let (handler, _task) = handler_with(Arc::new(BrokenGenerator), Arc::default());
    let caller = "+15550001111";

    handler.on_turn(caller, None).await.unwrap();
    let instruction = handler.on_turn(caller, Some("are you there")).await.unwrap();

    // The caller hears the apology and the listening window re-opens.
    assert!(instruction.continue_listening);
    assert!(!instruction.hang_up);
    assert_eq!(
        instruction.utterance,
        "I'm sorry, I'm having trouble processing your request right now."
    );

    // Only the user message landed; no synthetic assistant entry, and the
    // failure costs the caller no streak penalty.
    let session = handler.sessions().acquire(caller).await;
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].role, Role::User);
    assert_eq!(session.no_input_streak(), 0);
}

#[tokio::test]
async fn test_generation_timeout_is_a_failure() {
    let (handler, _task) = handler_with(Arc::new(StalledGenerator), Arc::default());

    let instruction = handler.on_turn("caller", Some("hello")).await.unwrap();
    assert!(instruction.continue_listening);
    assert_eq!(
        instruction.utterance,
        "I'm sorry, I'm having trouble processing your request right now."
    );
}

#[tokio::test]
async fn test_history_survives_new_call_streak_does_not() {
    let (handler, _task) = handler_with(Arc::new(EchoGenerator::new()), Arc::default());
    let caller = "+15550001111";

    handler.on_turn(caller, Some("hi")).await.unwrap();
    handler.on_turn(caller, None).await.unwrap();

    {
        let session = handler.sessions().acquire(caller).await;
        assert_eq!(session.no_input_streak(), 1);
    }

    // The same caller phones again: continuity of history, fresh streak.
    handler.on_call_start(caller).await.unwrap();

    let session = handler.sessions().acquire(caller).await;
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.no_input_streak(), 0);
}

#[tokio::test]
async fn test_concurrent_turns_same_caller_serialize() {
    let generator = Arc::new(EchoGenerator::with_delay(Duration::from_millis(30)));
    let (handler, _task) = handler_with(generator, Arc::default());
    let handler = Arc::new(handler);
    let caller = "+15550001111";

    let a = {
        let handler = handler.clone();
        tokio::spawn(async move { handler.on_turn(caller, Some("alpha")).await })
    };
    let b = {
        let handler = handler.clone();
        tokio::spawn(async move { handler.on_turn(caller, Some("bravo")).await })
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // The history is the serialization of the two turns in some order,
    // never a partial merge.
    let session = handler.sessions().acquire(caller).await;
    let contents: Vec<&str> = session.history().iter().map(|m| m.content.as_str()).collect();
    assert!(
        contents == ["alpha", "echo: alpha", "bravo", "echo: bravo"]
            || contents == ["bravo", "echo: bravo", "alpha", "echo: alpha"],
        "interleaved history: {:?}",
        contents
    );
}

#[tokio::test]
async fn test_concurrent_turns_different_callers_are_independent() {
    let generator = Arc::new(EchoGenerator::with_delay(Duration::from_millis(100)));
    let (handler, _task) = handler_with(generator, Arc::default());
    let handler = Arc::new(handler);

    let started = std::time::Instant::now();
    let turns: Vec<_> = (0..4)
        .map(|i| {
            let handler = handler.clone();
            tokio::spawn(async move {
                handler
                    .on_turn(&format!("+1555000{:04}", i), Some("hello"))
                    .await
            })
        })
        .collect();

    for turn in turns {
        turn.await.unwrap().unwrap();
    }

    // Four callers, one slow generator each: had the store serialized
    // them, this would take ~400ms.
    assert!(
        started.elapsed() < Duration::from_millis(350),
        "cross-caller latency coupling: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_missing_caller_id_fails_the_turn() {
    let (handler, _task) = handler_with(Arc::new(EchoGenerator::new()), Arc::default());

    let err = handler.on_turn("", Some("hello")).await.unwrap_err();
    assert!(matches!(err, EngineError::MissingCallerId));

    let err = handler.on_call_start("   ").await.unwrap_err();
    assert!(matches!(err, EngineError::MissingCallerId));
}
