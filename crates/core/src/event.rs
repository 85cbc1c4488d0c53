//! Turn events and outbound instructions
//!
//! The transport boundary of the engine: one inbound event per turn, one
//! outbound instruction back. The instruction is transport-agnostic; the
//! rendering layer turns it into whatever markup its transport requires.

use serde::{Deserialize, Serialize};

/// One inbound event for a caller's turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// Usable speech was transcribed
    Speech(String),
    /// The caller produced no usable speech within the listening window
    NoInput,
}

impl TurnEvent {
    /// Build an event from an optional raw transcript.
    ///
    /// A missing or blank transcript counts as no input.
    pub fn from_transcript(transcript: Option<&str>) -> Self {
        match transcript {
            Some(text) if !text.trim().is_empty() => TurnEvent::Speech(text.to_string()),
            _ => TurnEvent::NoInput,
        }
    }

    /// Did this event carry usable speech?
    pub fn is_speech(&self) -> bool {
        matches!(self, TurnEvent::Speech(_))
    }
}

/// What the telephony layer should do next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundInstruction {
    /// Text to speak to the caller
    pub utterance: String,
    /// Re-open the listening window after speaking
    pub continue_listening: bool,
    /// End the call after speaking
    pub hang_up: bool,
}

impl OutboundInstruction {
    /// Speak and keep listening for the next turn
    pub fn gather(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            continue_listening: true,
            hang_up: false,
        }
    }

    /// Speak a final notice and end the call
    pub fn hangup(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            continue_listening: false,
            hang_up: true,
        }
    }
}
