//! Typed automation failures.

use pagepilot_protocol::{ActionClass, ErrorBody, ErrorKind};
use thiserror::Error;

use crate::page::PageError;

/// Why an action did not produce an outcome.
#[derive(Debug, Error)]
pub enum AutomationFailure {
    /// The prompt input never rendered.
    #[error("Interface not ready: {0}")]
    InterfaceNotReady(String),

    /// The submit control was missing or stayed disabled.
    #[error("Submit control unavailable: {0}")]
    ControlUnavailable(String),

    #[error("No stable response within {waited_ms}ms")]
    ResponseTimeout { waited_ms: u64 },

    /// No image reference exists at all.
    #[error("Image resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("{class} action exceeded its {timeout_ms}ms deadline")]
    Timeout { class: ActionClass, timeout_ms: u64 },

    /// The action envelope could not be decoded.
    #[error("Unsupported action: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Page(#[from] PageError),
}

impl AutomationFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InterfaceNotReady(_) => ErrorKind::InterfaceNotReady,
            Self::ControlUnavailable(_) => ErrorKind::ControlUnavailable,
            Self::ResponseTimeout { .. } => ErrorKind::ResponseTimeout,
            Self::ResolutionFailed(_) => ErrorKind::ResolutionFailed,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Unsupported(_) | Self::Page(_) => ErrorKind::AutomationError,
        }
    }

    pub fn into_error_body(self) -> ErrorBody {
        ErrorBody::new(self.kind(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AutomationFailure::ControlUnavailable("disabled".into()).kind(),
            ErrorKind::ControlUnavailable
        );
        assert_eq!(
            AutomationFailure::Page(PageError::Transport("closed".into())).kind(),
            ErrorKind::AutomationError
        );

        let body = AutomationFailure::Timeout {
            class: ActionClass::Submit,
            timeout_ms: 15_000,
        }
        .into_error_body();
        assert_eq!(body.kind, ErrorKind::Timeout);
        assert!(body.message.contains("submit"));
    }
}
