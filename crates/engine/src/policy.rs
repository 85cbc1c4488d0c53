//! Turn Policy
//!
//! Pure decision logic for one turn: given the current session state and
//! the inbound event, pick the next action and the state mutation that
//! goes with it. No I/O happens here; reply generation and its failure
//! handling belong to the handler.

use call_agent_core::{sanitize_transcript, TurnEvent};

use crate::session::ConversationState;

/// What the handler should do for this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    /// Usable speech arrived; generate an assistant reply
    GenerateReply,
    /// No usable speech, below the threshold; ask the caller to repeat
    Reprompt,
    /// No usable speech for the threshold-th consecutive turn; end the call
    Terminate,
}

/// Decision table over (no-input streak, event)
#[derive(Debug, Clone, Copy)]
pub struct TurnPolicy {
    no_input_threshold: u32,
}

impl TurnPolicy {
    /// Create a policy terminating after `no_input_threshold` consecutive
    /// no-input turns. A threshold of zero is clamped to one.
    pub fn new(no_input_threshold: u32) -> Self {
        Self {
            no_input_threshold: no_input_threshold.max(1),
        }
    }

    pub fn no_input_threshold(&self) -> u32 {
        self.no_input_threshold
    }

    /// Decide the action for this turn without mutating anything
    pub fn decide(&self, state: &ConversationState, event: &TurnEvent) -> TurnAction {
        match event {
            TurnEvent::Speech(_) => TurnAction::GenerateReply,
            TurnEvent::NoInput => {
                if state.no_input_streak() + 1 >= self.no_input_threshold {
                    TurnAction::Terminate
                } else {
                    TurnAction::Reprompt
                }
            }
        }
    }

    /// Decide and apply the matching state mutation.
    ///
    /// Speech appends the sanitized user message and clears the streak;
    /// no-input increments the streak. The assistant message for a
    /// successful generation is appended later by the handler.
    pub fn apply(&self, state: &mut ConversationState, event: &TurnEvent) -> TurnAction {
        let action = self.decide(state, event);

        match event {
            TurnEvent::Speech(text) => {
                state.push_user(sanitize_transcript(text));
                state.clear_streak();
            }
            TurnEvent::NoInput => {
                state.record_no_input();
            }
        }

        action
    }
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    // The owned guard keeps its session alive independently of the store.
    async fn fresh_state() -> crate::session::SessionGuard {
        SessionStore::new().acquire("test").await
    }

    #[tokio::test]
    async fn test_speech_always_generates() {
        let policy = TurnPolicy::new(2);
        let mut state = fresh_state().await;

        state.record_no_input();
        let action = policy.decide(&state, &TurnEvent::Speech("hello".to_string()));
        assert_eq!(action, TurnAction::GenerateReply);
    }

    #[tokio::test]
    async fn test_no_input_below_threshold_reprompts() {
        let policy = TurnPolicy::new(2);
        let mut state = fresh_state().await;

        let action = policy.apply(&mut state, &TurnEvent::NoInput);
        assert_eq!(action, TurnAction::Reprompt);
        assert_eq!(state.no_input_streak(), 1);
    }

    #[tokio::test]
    async fn test_no_input_at_threshold_terminates() {
        let policy = TurnPolicy::new(2);
        let mut state = fresh_state().await;

        assert_eq!(policy.apply(&mut state, &TurnEvent::NoInput), TurnAction::Reprompt);
        assert_eq!(policy.apply(&mut state, &TurnEvent::NoInput), TurnAction::Terminate);
        assert_eq!(state.no_input_streak(), 2);
    }

    #[tokio::test]
    async fn test_speech_resets_streak() {
        let policy = TurnPolicy::new(3);
        let mut state = fresh_state().await;

        policy.apply(&mut state, &TurnEvent::NoInput);
        policy.apply(&mut state, &TurnEvent::NoInput);
        assert_eq!(state.no_input_streak(), 2);

        policy.apply(&mut state, &TurnEvent::Speech("back again".to_string()));
        assert_eq!(state.no_input_streak(), 0);

        // The streak starts over, so the next silence re-prompts.
        let action = policy.apply(&mut state, &TurnEvent::NoInput);
        assert_eq!(action, TurnAction::Reprompt);
    }

    #[tokio::test]
    async fn test_speech_appends_sanitized_message() {
        let policy = TurnPolicy::new(2);
        let mut state = fresh_state().await;

        policy.apply(&mut state, &TurnEvent::Speech("Hello, World! 123".to_string()));

        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].content, "Hello World 123");
    }

    #[tokio::test]
    async fn test_threshold_generalizes() {
        let policy = TurnPolicy::new(4);
        let mut state = fresh_state().await;

        for _ in 0..3 {
            assert_eq!(policy.apply(&mut state, &TurnEvent::NoInput), TurnAction::Reprompt);
        }
        assert_eq!(policy.apply(&mut state, &TurnEvent::NoInput), TurnAction::Terminate);
    }

    #[test]
    fn test_zero_threshold_clamped() {
        assert_eq!(TurnPolicy::new(0).no_input_threshold(), 1);
    }
}
