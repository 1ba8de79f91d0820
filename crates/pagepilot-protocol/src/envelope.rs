//! Wire envelopes.
//!
//! Commands (UI → Coordinator) and actions (Coordinator → Automation) share
//! one request shape; results and action outcomes share one reply shape:
//!
//! ```text
//! { correlationId, type, payload, issuedAt }
//! { correlationId, status: "ok" | "error", result?, error?: { kind, message } }
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ErrorKind, ProtocolError};
use crate::types::CorrelationId;

/// Request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub correlation_id: CorrelationId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    pub issued_at: DateTime<Utc>,
}

impl Envelope {
    /// Pack an adjacently tagged (`type`/`payload`) body.
    pub fn wrap<T: Serialize>(correlation_id: CorrelationId, body: &T) -> Result<Self, ProtocolError> {
        let value = serde_json::to_value(body)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidEnvelope("body has no `type` tag".to_string()))?
            .to_string();
        let payload = value.get("payload").cloned().unwrap_or_else(|| json!({}));

        Ok(Self {
            correlation_id,
            kind,
            payload,
            issued_at: Utc::now(),
        })
    }

    /// Unpack the body into a typed command or action.
    pub fn open<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let payload = if self.payload.is_null() {
            json!({})
        } else {
            self.payload.clone()
        };
        serde_json::from_value(json!({ "type": self.kind, "payload": payload })).map_err(|e| {
            ProtocolError::Payload {
                kind: self.kind.clone(),
                message: e.to_string(),
            }
        })
    }
}

/// Reply status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Typed failure carried by an error reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Reply envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub correlation_id: CorrelationId,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ResultEnvelope {
    pub fn ok<T: Serialize>(correlation_id: CorrelationId, result: &T) -> Result<Self, ProtocolError> {
        Ok(Self {
            correlation_id,
            status: Status::Ok,
            result: Some(serde_json::to_value(result)?),
            error: None,
        })
    }

    pub fn error(correlation_id: CorrelationId, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            correlation_id,
            status: Status::Error,
            result: None,
            error: Some(ErrorBody::new(kind, message)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Error kind of a failed reply.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Decode the reply into either the typed result or its error body.
    ///
    /// A reply whose `status` is `error` but carries no body, or whose
    /// result does not decode, is reported as an `AutomationError`.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ErrorBody> {
        match self.status {
            Status::Ok => {
                let value = self.result.unwrap_or(Value::Null);
                serde_json::from_value(value).map_err(|e| {
                    ErrorBody::new(ErrorKind::AutomationError, format!("undecodable result: {}", e))
                })
            }
            Status::Error => Err(self.error.unwrap_or_else(|| {
                ErrorBody::new(ErrorKind::AutomationError, "error reply without details")
            })),
        }
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
