use thiserror::Error;

/// Reasons a chat reply body cannot be turned into message content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("reply has no response payload")]
    MissingResponse,
    #[error("unsupported response type '{0}'")]
    UnsupportedType(String),
    #[error("response payload has no type field")]
    MissingType,
    #[error("text response data must be a string")]
    InvalidText,
    #[error("invalid table payload: {0}")]
    InvalidTable(String),
}

impl ContentError {
    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidTable(message.into())
    }
}
