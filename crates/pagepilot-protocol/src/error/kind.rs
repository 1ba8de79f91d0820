//! Error taxonomy shared by every context.

use serde::{Deserialize, Serialize};

/// Failure kind carried in the `error.kind` field of a result envelope.
///
/// Automation failures are translated into one of these kinds before they
/// reach the UI; nothing crosses a context boundary as a panic or raw page
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad input shape or length. Never retried automatically.
    ValidationError,
    /// Referenced aggregate is missing.
    NotFound,
    /// Another action holds the chat lock.
    Busy,
    /// The expected input control never appeared.
    InterfaceNotReady,
    /// The submit control was missing or stayed disabled.
    ControlUnavailable,
    /// Generation did not settle within the maximum wait.
    ResponseTimeout,
    /// Every resolution strategy came back empty.
    ResolutionFailed,
    /// No response from the Automation context within the deadline.
    Timeout,
    /// Any other automation-side failure (transport, script errors).
    AutomationError,
    /// The key-value store rejected a read or write.
    StorageError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::NotFound => "NotFound",
            Self::Busy => "Busy",
            Self::InterfaceNotReady => "InterfaceNotReady",
            Self::ControlUnavailable => "ControlUnavailable",
            Self::ResponseTimeout => "ResponseTimeout",
            Self::ResolutionFailed => "ResolutionFailed",
            Self::Timeout => "Timeout",
            Self::AutomationError => "AutomationError",
            Self::StorageError => "StorageError",
        }
    }

    /// Whether the UI should offer a retry affordance.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ValidationError)
    }

    /// Failures that usually mean the target site changed its structure
    /// rather than being slow.
    pub fn is_site_structure(&self) -> bool {
        matches!(
            self,
            Self::InterfaceNotReady | Self::ControlUnavailable | Self::ResolutionFailed
        )
    }

    /// Text the UI shows for this kind when it has nothing more specific.
    pub fn user_message(&self) -> &'static str {
        if self.is_site_structure() {
            return "automation target unavailable — the underlying site may have changed";
        }
        match self {
            Self::ValidationError => "please correct the highlighted input",
            Self::NotFound => "the requested item no longer exists",
            Self::Busy => "another action is running in this chat, try again shortly",
            Self::ResponseTimeout => "the response took too long to finish",
            Self::Timeout => "the page did not answer in time",
            Self::StorageError => "saving failed",
            _ => "the page action failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_not_retryable() {
        assert!(!ErrorKind::ValidationError.is_retryable());
        for kind in [
            ErrorKind::NotFound,
            ErrorKind::Busy,
            ErrorKind::InterfaceNotReady,
            ErrorKind::ControlUnavailable,
            ErrorKind::ResponseTimeout,
            ErrorKind::ResolutionFailed,
            ErrorKind::Timeout,
            ErrorKind::AutomationError,
        ] {
            assert!(kind.is_retryable(), "{kind} should be retryable");
        }
    }

    #[test]
    fn test_site_structure_message() {
        let msg = ErrorKind::InterfaceNotReady.user_message();
        assert!(msg.contains("site may have changed"));
        assert!(!ErrorKind::Timeout.user_message().contains("site may have changed"));
    }

    #[test]
    fn test_serialized_name_matches_display() {
        let json = serde_json::to_string(&ErrorKind::ResolutionFailed).unwrap();
        assert_eq!(json, "\"ResolutionFailed\"");
        assert_eq!(ErrorKind::ResolutionFailed.to_string(), "ResolutionFailed");
    }
}
