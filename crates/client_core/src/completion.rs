use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{AssistantReply, Message},
    error::ContentError,
    protocol::{ChatReplyBody, ChatRequest, HistoryEntry},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::settings::HistoryMode;

pub const FALLBACK_REPLY_TEXT: &str = "Sorry, I'm having trouble connecting. Please try again.";
pub const TIMEOUT_REPLY_TEXT: &str = "The assistant took too long to respond. Please try again.";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("chat request failed: {0}")]
    Transport(String),
    #[error("chat endpoint returned status {0}")]
    Status(u16),
    #[error("chat reply is not valid JSON: {0}")]
    Decode(String),
    #[error("chat reply has invalid content: {0}")]
    InvalidContent(#[from] ContentError),
    #[error("chat request timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantReply, CompletionError>;
}

pub struct HttpCompletionClient {
    http: Client,
    chat_url: Url,
}

impl HttpCompletionClient {
    pub fn new(chat_url: Url) -> Self {
        Self::with_client(Client::new(), chat_url)
    }

    pub fn with_client(http: Client, chat_url: Url) -> Self {
        Self { http, chat_url }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantReply, CompletionError> {
        let res = self
            .http
            .post(self.chat_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(CompletionError::Status(status.as_u16()));
        }

        let raw = res
            .text()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;
        let body: ChatReplyBody =
            serde_json::from_str(&raw).map_err(|err| CompletionError::Decode(err.to_string()))?;

        Ok(body.normalize()?)
    }
}

/// Builds the request for `query`. `transcript` must already end with the user's message.
pub fn build_request(
    user_id: &str,
    query: &str,
    transcript: &[Message],
    mode: HistoryMode,
) -> ChatRequest {
    let conversation_history = match mode {
        HistoryMode::Full => Some(transcript.iter().map(HistoryEntry::from_message).collect()),
        HistoryMode::ServerMemory => None,
    };
    ChatRequest {
        user_id: user_id.to_string(),
        query: query.to_string(),
        conversation_history,
    }
}

pub fn fallback_reply(err: &CompletionError) -> AssistantReply {
    match err {
        CompletionError::Timeout(_) => AssistantReply::text(TIMEOUT_REPLY_TEXT),
        _ => AssistantReply::text(FALLBACK_REPLY_TEXT),
    }
}

/// Runs one completion and always yields something to show: the reply, or a fallback.
pub async fn complete_or_fallback(
    client: &dyn CompletionClient,
    request: &ChatRequest,
    timeout: Option<Duration>,
) -> AssistantReply {
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, client.complete(request))
            .await
            .unwrap_or(Err(CompletionError::Timeout(limit))),
        None => client.complete(request).await,
    };

    match outcome {
        Ok(reply) => {
            debug!(source = ?reply.source_tag, "chat: completion succeeded");
            reply
        }
        Err(err) => {
            warn!(error = %err, "chat: completion failed; showing fallback reply");
            fallback_reply(&err)
        }
    }
}

#[cfg(test)]
#[path = "tests/completion_tests.rs"]
mod tests;
