use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(MessageId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// Where an assistant answer came from. Only drives the badge next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    KnowledgeBase,
    Generative,
    Unknown,
}

impl SourceTag {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "knowledge_base" | "knowledgebase" | "kb" => Self::KnowledgeBase,
            "generative" | "gpt" | "llm" => Self::Generative,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContent {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableContent {
    /// A table without headers or without rows has nothing to show.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    Text { value: String },
    Table(TableContent),
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::Table(TableContent { headers, rows })
    }

    /// Flattened form used when a message is replayed as conversation history.
    pub fn as_plain_text(&self) -> String {
        match self {
            Self::Text { value } => value.clone(),
            Self::Table(table) => {
                let mut lines = Vec::with_capacity(table.rows.len() + 1);
                if !table.headers.is_empty() {
                    lines.push(table.headers.join(" | "));
                }
                lines.extend(table.rows.iter().map(|row| row.join(" | ")));
                lines.join("\n")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tag: Option<SourceTag>,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::User,
            content: MessageContent::text(text),
            source_tag: None,
            sent_at: Utc::now(),
        }
    }

    pub fn assistant(id: MessageId, reply: AssistantReply) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            content: reply.content,
            source_tag: reply.source_tag,
            sent_at: Utc::now(),
        }
    }
}

/// Normalised assistant answer, before it is given an id and appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub content: MessageContent,
    pub source_tag: Option<SourceTag>,
}

impl AssistantReply {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            content: MessageContent::text(value),
            source_tag: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
    Error(String),
}
