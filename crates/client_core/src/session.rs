//! Conversation session controller.
//!
//! Ties the transcript, the input mediator, the completion client and the
//! speech capability together. States are `idle` and `awaiting_response`;
//! voice listening runs alongside either. Only one completion is in flight at
//! a time, so transcript order is completion order.

use std::{
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};

use shared::{
    domain::{Message, MessageId, VoiceState},
    protocol::ChatRequest,
};
use tokio::{
    sync::{broadcast, mpsc, Mutex as AsyncMutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    completion::{build_request, complete_or_fallback, CompletionClient},
    input::{InputMediator, SubmitRejected},
    settings::{ClientSettings, HistoryMode},
    transcript::TranscriptStore,
    voice::{ListeningSession, RecognitionEvent, RecognitionOptions, SpeechRecognizer},
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub user_id: String,
    pub greeting: String,
    pub history_mode: HistoryMode,
    pub request_timeout: Option<Duration>,
    pub recognition: RecognitionOptions,
}

impl From<&ClientSettings> for SessionOptions {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            user_id: settings.user_id.clone(),
            greeting: settings.greeting.clone(),
            history_mode: settings.history_mode,
            request_timeout: settings.request_timeout,
            recognition: RecognitionOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TranscriptAppended(Message),
    AwaitingChanged(bool),
    VoiceStateChanged(VoiceState),
}

/// Everything the render layer needs, copied out under the lock.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub transcript: Vec<Message>,
    pub pending_input: String,
    pub is_awaiting_response: bool,
    pub voice_state: VoiceState,
}

struct SessionState {
    transcript: TranscriptStore,
    input: InputMediator,
    awaiting_response: bool,
}

struct ActiveListening {
    generation: u64,
    session: Box<dyn ListeningSession>,
    event_task: JoinHandle<()>,
}

#[derive(Default)]
struct VoiceSlot {
    active: Option<ActiveListening>,
    generation: u64,
}

/// Handle to the completion started by an accepted submission.
pub struct PendingReply {
    user_message_id: MessageId,
    task: JoinHandle<()>,
}

impl PendingReply {
    pub fn user_message_id(&self) -> MessageId {
        self.user_message_id
    }

    /// Resolves once the assistant reply (or fallback) is in the transcript.
    pub async fn wait(self) {
        if let Err(err) = self.task.await {
            warn!(error = %err, "chat: completion task did not finish");
        }
    }
}

pub struct SessionController {
    completion: Arc<dyn CompletionClient>,
    recognizer: Arc<dyn SpeechRecognizer>,
    options: SessionOptions,
    state: Mutex<SessionState>,
    voice: AsyncMutex<VoiceSlot>,
    events: broadcast::Sender<SessionEvent>,
}

/// Clears the awaiting flag however the completion task ends, including abort.
struct AwaitingGuard<'a> {
    controller: &'a SessionController,
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        self.controller.lock_state().awaiting_response = false;
        self.controller.emit(SessionEvent::AwaitingChanged(false));
    }
}

impl SessionController {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        recognizer: Arc<dyn SpeechRecognizer>,
        options: SessionOptions,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = SessionState {
            transcript: TranscriptStore::seeded(options.greeting.clone()),
            input: InputMediator::default(),
            awaiting_response: false,
        };
        Arc::new(Self {
            completion,
            recognizer,
            options,
            state: Mutex::new(state),
            voice: AsyncMutex::new(VoiceSlot::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn view(&self) -> SessionView {
        let state = self.lock_state();
        SessionView {
            transcript: state.transcript.messages().to_vec(),
            pending_input: state.input.pending_input().to_string(),
            is_awaiting_response: state.awaiting_response,
            voice_state: state.input.voice_state().clone(),
        }
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.lock_state().transcript.messages().to_vec()
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.lock_state().awaiting_response
    }

    pub fn voice_state(&self) -> VoiceState {
        self.lock_state().input.voice_state().clone()
    }

    pub fn edit_pending(&self, text: impl Into<String>) {
        self.lock_state().input.edit_pending(text);
    }

    pub fn submit_pending(self: &Arc<Self>) -> Result<PendingReply, SubmitRejected> {
        let pending = self.lock_state().input.pending_input().to_string();
        self.submit(&pending)
    }

    /// Appends the user's message and starts the completion. Rejections leave
    /// the session untouched.
    pub fn submit(self: &Arc<Self>, text: &str) -> Result<PendingReply, SubmitRejected> {
        let (message, request) = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let query = state.input.accept(text, state.awaiting_response)?;
            let message = state.transcript.push_user(query.clone()).clone();
            state.awaiting_response = true;
            let request = build_request(
                &self.options.user_id,
                &query,
                state.transcript.messages(),
                self.options.history_mode,
            );
            (message, request)
        };

        info!(message_id = message.id.0, "chat: submitted query");
        let user_message_id = message.id;
        self.emit(SessionEvent::TranscriptAppended(message));
        self.emit(SessionEvent::AwaitingChanged(true));

        let controller = Arc::clone(self);
        let task = tokio::spawn(async move { controller.run_completion(request).await });

        Ok(PendingReply {
            user_message_id,
            task,
        })
    }

    async fn run_completion(&self, request: ChatRequest) {
        let _awaiting = AwaitingGuard { controller: self };

        let reply = complete_or_fallback(
            self.completion.as_ref(),
            &request,
            self.options.request_timeout,
        )
        .await;

        let message = self.lock_state().transcript.push_assistant(reply).clone();
        debug!(message_id = message.id.0, "chat: reply appended");
        self.emit(SessionEvent::TranscriptAppended(message));
    }

    /// Mic control. Stops the active recognition if there is one, otherwise starts one.
    pub async fn toggle_listening(self: &Arc<Self>) {
        let mut slot = self.voice.lock().await;

        if let Some(active) = slot.active.take() {
            active.session.stop();
            active.event_task.abort();
            self.update_voice(|input| input.listening_stopped());
            info!("voice: listening stopped by user");
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        match self
            .recognizer
            .start_listening(&self.options.recognition, tx)
            .await
        {
            Ok(session) => {
                slot.generation += 1;
                let generation = slot.generation;
                self.update_voice(|input| input.listening_started());
                let event_task = self.spawn_recognition_task(generation, rx);
                slot.active = Some(ActiveListening {
                    generation,
                    session,
                    event_task,
                });
                info!(generation, "voice: listening started");
            }
            Err(err) => {
                warn!(error = %err, "voice: could not start listening");
                self.update_voice(|input| input.voice_failed(&err));
            }
        }
    }

    fn spawn_recognition_task(
        self: &Arc<Self>,
        generation: u64,
        mut rx: mpsc::UnboundedReceiver<RecognitionEvent>,
    ) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                match event {
                    RecognitionEvent::Result(transcript) => {
                        debug!(generation, "voice: recognized utterance");
                        if let Err(rejected) = controller.submit(&transcript) {
                            debug!(reason = %rejected, "voice: recognized text not submitted");
                        }
                    }
                    RecognitionEvent::Error(err) => {
                        warn!(generation, error = %err, "voice: recognition failed");
                        controller.update_voice(|input| input.voice_failed(&err));
                    }
                    RecognitionEvent::End => {
                        controller.finish_listening(generation).await;
                        return;
                    }
                }
            }
            // Recognizer dropped its sender without an explicit end.
            if let Some(controller) = weak.upgrade() {
                controller.finish_listening(generation).await;
            }
        })
    }

    async fn finish_listening(&self, generation: u64) {
        let mut slot = self.voice.lock().await;
        let is_current = slot
            .active
            .as_ref()
            .is_some_and(|active| active.generation == generation);
        if !is_current {
            return;
        }
        if let Some(active) = slot.active.take() {
            active.session.stop();
        }
        self.update_voice(|input| input.listening_ended());
        debug!(generation, "voice: listening ended");
    }

    /// Releases the microphone and detaches recognition callbacks.
    pub async fn dispose(&self) {
        let active = self.voice.lock().await.active.take();
        if let Some(active) = active {
            active.session.stop();
            active.event_task.abort();
            self.update_voice(|input| input.listening_stopped());
            info!("voice: released microphone on dispose");
        }
    }

    fn update_voice(&self, apply: impl FnOnce(&mut InputMediator)) {
        let voice_state = {
            let mut state = self.lock_state();
            apply(&mut state.input);
            state.input.voice_state().clone()
        };
        self.emit(SessionEvent::VoiceStateChanged(voice_state));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
