use std::{fs, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str =
    "https://chennai-gpt-api-abhkambkefbxgfem.centralindia-01.azurewebsites.net/api";
pub const DEFAULT_USER_ID: &str = "user-123";
pub const DEFAULT_GREETING: &str =
    "Hola! I am your Kyndryl Americas Incubation Pod AI assistant. How can I help you today?";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CHAT_PATH: &str = "handlechat";
const PANEL_DATA_PATH: &str = "getpaneldata";

/// Whether each chat request replays the transcript or relies on server-side memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    Full,
    #[default]
    ServerMemory,
}

impl FromStr for HistoryMode {
    type Err = SettingsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "full" => Ok(Self::Full),
            "server_memory" | "server" => Ok(Self::ServerMemory),
            _ => Err(SettingsError::InvalidHistoryMode(raw.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("invalid history mode '{0}' (expected 'full' or 'server_memory')")]
    InvalidHistoryMode(String),
    #[error("invalid request timeout '{0}'")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub user_id: String,
    pub history_mode: HistoryMode,
    /// `None` waits for the backend indefinitely.
    pub request_timeout: Option<Duration>,
    pub greeting: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            user_id: DEFAULT_USER_ID.into(),
            history_mode: HistoryMode::default(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            greeting: DEFAULT_GREETING.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    user_id: Option<String>,
    history_mode: Option<HistoryMode>,
    request_timeout_secs: Option<u64>,
    greeting: Option<String>,
}

impl ClientSettings {
    pub fn chat_url(&self) -> Result<Url, SettingsError> {
        self.endpoint(CHAT_PATH)
    }

    pub fn panel_data_url(&self) -> Result<Url, SettingsError> {
        self.endpoint(PANEL_DATA_PATH)
    }

    fn endpoint(&self, path: &str) -> Result<Url, SettingsError> {
        let invalid = |source: url::ParseError| SettingsError::InvalidBaseUrl {
            url: self.api_base_url.clone(),
            source,
        };
        // A base without a trailing slash would have its last segment replaced by `join`.
        let mut base = self.api_base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .and_then(|base| base.join(path))
            .map_err(invalid)
    }

    pub fn apply_toml(&mut self, raw: &str) -> Result<(), SettingsError> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file.user_id {
            self.user_id = v;
        }
        if let Some(v) = file.history_mode {
            self.history_mode = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout = timeout_from_secs(v);
        }
        if let Some(v) = file.greeting {
            self.greeting = v;
        }
        Ok(())
    }

    /// Applies environment overrides through `lookup` so tests need not touch the process env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CHAT_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("APP__API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("APP__USER_ID") {
            self.user_id = v;
        }
        if let Some(v) = lookup("APP__HISTORY_MODE") {
            self.history_mode = v.parse()?;
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            let secs = v
                .trim()
                .parse::<u64>()
                .map_err(|_| SettingsError::InvalidTimeout(v.clone()))?;
            self.request_timeout = timeout_from_secs(secs);
        }
        if let Some(v) = lookup("APP__GREETING") {
            self.greeting = v;
        }
        Ok(())
    }
}

pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Defaults, then the TOML file at `path` if it exists, then environment overrides.
pub fn load_settings(path: &Path) -> Result<ClientSettings, SettingsError> {
    let mut settings = ClientSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            debug!("settings: loading file path={}", path.display());
            settings.apply_toml(&raw)?;
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("settings: no file at {}, using defaults", path.display());
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    }

    settings.apply_env(|key| std::env::var(key).ok())?;

    if settings.request_timeout.is_none() {
        warn!("settings: chat request timeout disabled; a hung backend blocks further input");
    }

    settings.chat_url()?;
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
