use shared::domain::VoiceState;
use thiserror::Error;

use crate::voice::VoiceError;

/// Why a submission was dropped. Front-ends treat both as a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("nothing to send")]
    EmptyInput,
    #[error("still waiting for the previous reply")]
    AwaitingResponse,
}

/// Reconciles the typed input field and speech results into one outgoing query.
#[derive(Debug, Clone, Default)]
pub struct InputMediator {
    pending_input: String,
    voice_state: VoiceState,
}

impl InputMediator {
    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn edit_pending(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Validates `text` and returns the trimmed query. Clears the input field on success.
    pub fn accept(&mut self, text: &str, awaiting_response: bool) -> Result<String, SubmitRejected> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SubmitRejected::EmptyInput);
        }
        if awaiting_response {
            return Err(SubmitRejected::AwaitingResponse);
        }
        self.pending_input.clear();
        Ok(trimmed.to_string())
    }

    pub fn voice_state(&self) -> &VoiceState {
        &self.voice_state
    }

    pub fn is_listening(&self) -> bool {
        self.voice_state == VoiceState::Listening
    }

    pub fn listening_started(&mut self) {
        self.voice_state = VoiceState::Listening;
    }

    pub fn voice_failed(&mut self, err: &VoiceError) {
        self.voice_state = VoiceState::Error(err.user_message().to_string());
    }

    /// Normal end of an utterance. An error notice stays up until the next attempt.
    pub fn listening_ended(&mut self) {
        if self.voice_state == VoiceState::Listening {
            self.voice_state = VoiceState::Idle;
        }
    }

    pub fn listening_stopped(&mut self) {
        self.voice_state = VoiceState::Idle;
    }
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
