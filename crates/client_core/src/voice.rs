//! Speech recognition as an injected capability.
//!
//! The controller owns at most one [`ListeningSession`] at a time. A recognizer
//! reports progress through the event channel it is handed on start and must
//! send [`RecognitionEvent::End`] once the utterance is over.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub const UNSUPPORTED_MESSAGE: &str =
    "Sorry, voice input is not supported in this environment.";
pub const PERMISSION_DENIED_MESSAGE: &str =
    "Microphone access was denied. Please allow microphone permissions and try again.";
pub const NO_RESULT_MESSAGE: &str = "Sorry, I didn't catch that. Please try speaking again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub continuous: bool,
    pub interim_results: bool,
    pub language: String,
    pub max_alternatives: u8,
}

impl Default for RecognitionOptions {
    /// Single utterance, final results only, English, one alternative.
    fn default() -> Self {
        Self {
            continuous: false,
            interim_results: false,
            language: "en-US".into(),
            max_alternatives: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("speech recognition is unavailable")]
    Unsupported,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("recognizer produced no result: {0}")]
    NoResult(String),
}

impl VoiceError {
    /// Fixed text shown next to the input control.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unsupported => UNSUPPORTED_MESSAGE,
            Self::PermissionDenied => PERMISSION_DENIED_MESSAGE,
            Self::NoResult(_) => NO_RESULT_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Result(String),
    Error(VoiceError),
    End,
}

pub trait ListeningSession: Send + Sync {
    /// Releases the microphone. Must be safe to call after the session already ended.
    fn stop(&self);
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn start_listening(
        &self,
        options: &RecognitionOptions,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<Box<dyn ListeningSession>, VoiceError>;
}

pub struct MissingSpeechRecognizer;

#[async_trait]
impl SpeechRecognizer for MissingSpeechRecognizer {
    async fn start_listening(
        &self,
        _options: &RecognitionOptions,
        _events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<Box<dyn ListeningSession>, VoiceError> {
        Err(VoiceError::Unsupported)
    }
}
