//! Coordinator ↔ Automation actions and outcomes.
//!
//! An action carries only what one page operation needs; the Automation
//! context keeps no aggregate state between actions.

use serde::{Deserialize, Serialize};

/// A page-level action forwarded to the Automation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum Action {
    /// Poll for the prompt input.
    PrepareInterface {},
    /// Fill the prompt input and activate the submit control.
    SubmitPrompt { text: String },
    /// Wait for the reply that follows `baseline`.
    AwaitResponse { baseline: ResponseBaseline },
    /// Resolve the newest generated image to its full-resolution source.
    ExtractImage {
        #[serde(default)]
        known_url: Option<String>,
    },
}

impl Action {
    pub fn class(&self) -> ActionClass {
        match self {
            Self::PrepareInterface {} => ActionClass::Prepare,
            Self::SubmitPrompt { .. } => ActionClass::Submit,
            Self::AwaitResponse { .. } => ActionClass::AwaitResponse,
            Self::ExtractImage { .. } => ActionClass::ExtractImage,
        }
    }
}

/// Timeout class of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    Prepare,
    Submit,
    AwaitResponse,
    ExtractImage,
}

impl std::fmt::Display for ActionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Prepare => "prepare",
            Self::Submit => "submit",
            Self::AwaitResponse => "await_response",
            Self::ExtractImage => "extract_image",
        };
        f.write_str(s)
    }
}

/// Page counts captured right before a prompt is submitted.
///
/// Lets `AwaitResponse` tell the new reply apart from older ones without
/// the Automation context remembering anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBaseline {
    pub assistant_messages: usize,
    pub images: usize,
}

/// Successful action outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum ActionOutcome {
    Ready {},
    Submitted { baseline: ResponseBaseline },
    Response { text: String, attachments: Vec<String> },
    Image(ImageResolution),
}

/// Strategy of the image resolution chain, in attempt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionStrategy {
    Attribute,
    Interaction,
    UrlRewrite,
    RawFallback,
}

impl ResolutionStrategy {
    pub const ORDER: [ResolutionStrategy; 4] = [
        Self::Attribute,
        Self::Interaction,
        Self::UrlRewrite,
        Self::RawFallback,
    ];
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Attribute => "attribute",
            Self::Interaction => "interaction",
            Self::UrlRewrite => "urlRewrite",
            Self::RawFallback => "rawFallback",
        };
        f.write_str(s)
    }
}

/// One step of a resolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: ResolutionStrategy,
    pub succeeded: bool,
    pub detail: String,
}

/// Result of the resolution chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResolution {
    /// Low-resolution reference the chain started from.
    pub original_url: String,
    pub resolved_url: String,
    pub strategy: ResolutionStrategy,
    /// Set when only the raw fallback produced a reference.
    pub degraded: bool,
    #[serde(default)]
    pub attempts: Vec<StrategyAttempt>,
}

impl ImageResolution {
    pub fn attempted(&self) -> Vec<ResolutionStrategy> {
        self.attempts.iter().map(|a| a.strategy).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_class() {
        assert_eq!(Action::PrepareInterface {}.class(), ActionClass::Prepare);
        assert_eq!(
            Action::ExtractImage { known_url: None }.class(),
            ActionClass::ExtractImage
        );
    }

    #[test]
    fn test_outcome_wire_shape() {
        let outcome = ActionOutcome::Submitted {
            baseline: ResponseBaseline {
                assistant_messages: 2,
                images: 1,
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["type"], "Submitted");
        assert_eq!(json["payload"]["baseline"]["assistantMessages"], 2);
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(ResolutionStrategy::ORDER[0], ResolutionStrategy::Attribute);
        assert_eq!(ResolutionStrategy::ORDER[3], ResolutionStrategy::RawFallback);
        assert_eq!(
            serde_json::to_string(&ResolutionStrategy::UrlRewrite).unwrap(),
            "\"urlRewrite\""
        );
    }
}
