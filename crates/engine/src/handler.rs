//! Call Handler
//!
//! Orchestrates one webhook exchange: resolve the caller's session, run the
//! turn policy, generate a reply when the turn carries speech, schedule the
//! transcript write, and produce the outbound instruction for the telephony
//! rendering layer.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use call_agent_config::EngineConfig;
use call_agent_core::{Message, OutboundInstruction, ReplyGenerator, TurnEvent};

use crate::persist::TranscriptWriter;
use crate::policy::{TurnAction, TurnPolicy};
use crate::session::SessionStore;
use crate::EngineError;

/// Per-turn orchestrator
///
/// One instance serves every caller; all per-caller state lives in the
/// session store.
pub struct CallHandler {
    sessions: Arc<SessionStore>,
    policy: TurnPolicy,
    generator: Arc<dyn ReplyGenerator>,
    transcripts: TranscriptWriter,
    config: EngineConfig,
}

impl CallHandler {
    pub fn new(
        sessions: Arc<SessionStore>,
        generator: Arc<dyn ReplyGenerator>,
        transcripts: TranscriptWriter,
        config: EngineConfig,
    ) -> Self {
        Self {
            sessions,
            policy: TurnPolicy::new(config.no_input_threshold),
            generator,
            transcripts,
            config,
        }
    }

    /// Session store shared with this handler
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle the start of an inbound call.
    ///
    /// A caller who phoned before keeps their history; only the no-input
    /// streak starts over with the new call.
    pub async fn on_call_start(&self, caller_id: &str) -> Result<OutboundInstruction, EngineError> {
        let caller_id = validate_caller_id(caller_id)?;

        let mut session = self.sessions.acquire(caller_id).await;
        session.clear_streak();
        let prior_turns = session.history().len();
        drop(session);

        tracing::info!(caller_id = %caller_id, prior_turns, "Call started");

        Ok(OutboundInstruction::gather(self.config.greeting.clone()))
    }

    /// Handle one turn: speech or silence.
    pub async fn on_turn(
        &self,
        caller_id: &str,
        transcript: Option<&str>,
    ) -> Result<OutboundInstruction, EngineError> {
        let caller_id = validate_caller_id(caller_id)?;
        let event = TurnEvent::from_transcript(transcript);

        let mut session = self.sessions.acquire(caller_id).await;
        let action = self.policy.apply(&mut session, &event);

        let instruction = match action {
            TurnAction::GenerateReply => {
                let utterance = self.generate_reply(caller_id, session.history()).await;
                if let Some(reply) = &utterance {
                    session.push_assistant(reply.clone());
                }
                OutboundInstruction::gather(
                    utterance.unwrap_or_else(|| self.config.apology.clone()),
                )
            }
            TurnAction::Reprompt => {
                tracing::info!(
                    caller_id = %caller_id,
                    streak = session.no_input_streak(),
                    "No input, re-prompting"
                );
                OutboundInstruction::gather(self.config.reprompt.clone())
            }
            TurnAction::Terminate => {
                tracing::info!(
                    caller_id = %caller_id,
                    streak = session.no_input_streak(),
                    "No input threshold reached, terminating call"
                );
                OutboundInstruction::hangup(self.config.farewell.clone())
            }
        };

        // Persistence is defined over the transcript, not the counters:
        // a re-prompt turn leaves nothing new to write. Snapshot under the
        // lock; dispatch after it is released.
        let snapshot = match action {
            TurnAction::GenerateReply => Some(session.snapshot()),
            TurnAction::Terminate if !session.history().is_empty() => Some(session.snapshot()),
            _ => None,
        };
        drop(session);

        if action == TurnAction::Terminate {
            self.sessions.remove(caller_id);
        }

        if let Some(history) = snapshot {
            self.transcripts.schedule(caller_id, history);
        }

        Ok(instruction)
    }

    /// Call the reply generator under the configured budget.
    ///
    /// Returns the reply text, or `None` on failure or timeout: the caller
    /// hears the fixed apology, keeps their turn history as-is and pays no
    /// streak penalty.
    async fn generate_reply(&self, caller_id: &str, history: &[Message]) -> Option<String> {
        let budget = Duration::from_millis(self.config.reply_timeout_ms);

        match timeout(budget, self.generator.generate(history)).await {
            Ok(Ok(reply)) => Some(reply.content),
            Ok(Err(e)) => {
                tracing::error!(caller_id = %caller_id, error = %e, "Reply generation failed");
                None
            }
            Err(_) => {
                tracing::error!(
                    caller_id = %caller_id,
                    budget_ms = self.config.reply_timeout_ms,
                    "Reply generation timed out"
                );
                None
            }
        }
    }
}

fn validate_caller_id(caller_id: &str) -> Result<&str, EngineError> {
    let trimmed = caller_id.trim();
    if trimmed.is_empty() {
        return Err(EngineError::MissingCallerId);
    }
    Ok(trimmed)
}
