//! Coordinator errors.

use pagepilot_protocol::{ActionClass, ChatId, ErrorBody, ErrorKind, ProtocolError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Bad input shape or length.
    #[error("{0}")]
    Validation(String),

    /// A referenced aggregate does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Another action holds the chat.
    #[error("Chat {0} is busy with another action")]
    Busy(ChatId),

    /// Typed failure reported by the automation context.
    #[error("{0}")]
    Automation(ErrorBody),

    /// No outcome within the action deadline.
    #[error("No {class} outcome within {timeout_ms}ms")]
    Timeout { class: ActionClass, timeout_ms: u64 },

    /// The automation link is down.
    #[error("Automation context unavailable: {0}")]
    Disconnected(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl CoordinatorError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} {} not found", what, id))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Busy(_) => ErrorKind::Busy,
            Self::Automation(body) => body.kind,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Disconnected(_) => ErrorKind::AutomationError,
            Self::Storage(_) => ErrorKind::StorageError,
            // An envelope that does not decode is a malformed command.
            Self::Protocol(_) => ErrorKind::ValidationError,
        }
    }

    /// Wire error body. Automation failures keep the page detail.
    pub fn to_error_body(&self) -> ErrorBody {
        match self {
            Self::Automation(body) => body.clone(),
            other => ErrorBody::new(other.kind(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            CoordinatorError::not_found("project", "p-1").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoordinatorError::Busy(ChatId::from("c-1")).kind(),
            ErrorKind::Busy
        );
        assert_eq!(
            CoordinatorError::Storage(StoreError::Backend("disk full".into())).kind(),
            ErrorKind::StorageError
        );
    }

    #[test]
    fn test_automation_body_passes_through() {
        let body = ErrorBody::new(ErrorKind::ControlUnavailable, "send button disabled");
        let err = CoordinatorError::Automation(body.clone());
        assert_eq!(err.kind(), ErrorKind::ControlUnavailable);
        assert_eq!(err.to_error_body(), body);
    }
}
