use chrono::Utc;
use shared::domain::{AssistantReply, Message, MessageContent, MessageId, Sender};
use thiserror::Error;

/// Id given to the greeting every session starts with.
pub const GREETING_MESSAGE_ID: MessageId = MessageId(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("message id {attempted} is not after the last id {last}")]
    NonMonotonicId { attempted: i64, last: i64 },
}

/// Append-only, ordered log of the chat. Entries are never edited or removed.
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    messages: Vec<Message>,
}

impl TranscriptStore {
    pub fn seeded(greeting: impl Into<String>) -> Self {
        let greeting = Message {
            id: GREETING_MESSAGE_ID,
            sender: Sender::Assistant,
            content: MessageContent::text(greeting),
            source_tag: None,
            sent_at: Utc::now(),
        };
        Self {
            messages: vec![greeting],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Time-based id, bumped past the previous id when the clock has not moved.
    pub fn next_id(&self) -> MessageId {
        let now = Utc::now().timestamp_millis();
        match self.messages.last() {
            Some(last) => MessageId(now.max(last.id.0 + 1)),
            None => MessageId(now),
        }
    }

    pub fn append(&mut self, message: Message) -> Result<&[Message], TranscriptError> {
        if let Some(last) = self.messages.last() {
            if message.id <= last.id {
                return Err(TranscriptError::NonMonotonicId {
                    attempted: message.id.0,
                    last: last.id.0,
                });
            }
        }
        self.messages.push(message);
        Ok(&self.messages)
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &Message {
        let message = Message::user(self.next_id(), text);
        self.push_allocated(message)
    }

    pub fn push_assistant(&mut self, reply: AssistantReply) -> &Message {
        let message = Message::assistant(self.next_id(), reply);
        self.push_allocated(message)
    }

    // Ids from `next_id` always sort after the tail, so this cannot hit the ordering check.
    fn push_allocated(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        let last = self.messages.len() - 1;
        &self.messages[last]
    }
}

#[cfg(test)]
#[path = "tests/transcript_tests.rs"]
mod tests;
