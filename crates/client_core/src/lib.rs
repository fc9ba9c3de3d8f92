//! Client-side core of the Chennai assistant: conversation session, backend
//! clients and the pure render projection consumed by front-ends.

pub mod completion;
pub mod input;
pub mod panel;
pub mod render;
pub mod session;
pub mod settings;
pub mod transcript;
pub mod voice;

pub use completion::{CompletionClient, CompletionError, HttpCompletionClient};
pub use input::SubmitRejected;
pub use panel::{load_panel_data, HttpPanelDataSource, PanelDataSource, PanelError};
pub use render::{project, ScreenView, UiPrefs};
pub use session::{PendingReply, SessionController, SessionEvent, SessionOptions, SessionView};
pub use settings::{load_settings, ClientSettings, HistoryMode, SettingsError};
pub use voice::{MissingSpeechRecognizer, SpeechRecognizer, VoiceError};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
