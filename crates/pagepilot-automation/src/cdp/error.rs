//! DevTools client errors.

use thiserror::Error;

use crate::page::PageError;

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    /// No open tab matches the target site.
    #[error("No page open for {0}")]
    PageNotFound(String),

    /// Script threw inside the page.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// The addressed element is no longer in the document.
    #[error("Element missing: {0}")]
    ElementMissing(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ElementMissing(what) => PageError::Detached(what),
            CdpError::JavaScript(msg) => PageError::Script(msg),
            // "Cannot find context" and friends during a re-render
            CdpError::Protocol { code: -32000, message } => PageError::Script(message),
            CdpError::Timeout(msg) => PageError::Timeout(msg),
            other => PageError::Transport(other.to_string()),
        }
    }
}
