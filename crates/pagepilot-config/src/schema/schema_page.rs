//! Page structure knowledge: selectors and image resolution rules.
//!
//! Every target is an ordered list of alternatives. The first selector
//! that matches at least one element wins, so a redesign that breaks one
//! selector degrades to the next instead of failing outright.

use serde::{Deserialize, Serialize};

/// Selector alternatives for each semantic page target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorsConfig {
    #[serde(default = "default_prompt_input")]
    pub prompt_input: Vec<String>,

    #[serde(default = "default_submit_button")]
    pub submit_button: Vec<String>,

    #[serde(default = "default_assistant_message")]
    pub assistant_message: Vec<String>,

    /// Present while the site is still generating.
    #[serde(default = "default_generating_indicator")]
    pub generating_indicator: Vec<String>,

    #[serde(default = "default_generated_image")]
    pub generated_image: Vec<String>,

    /// Control that opens the full-size view of an image.
    #[serde(default = "default_full_size_trigger")]
    pub full_size_trigger: Vec<String>,

    /// Image shown inside the full-size view.
    #[serde(default = "default_full_size_image")]
    pub full_size_image: Vec<String>,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            prompt_input: default_prompt_input(),
            submit_button: default_submit_button(),
            assistant_message: default_assistant_message(),
            generating_indicator: default_generating_indicator(),
            generated_image: default_generated_image(),
            full_size_trigger: default_full_size_trigger(),
            full_size_image: default_full_size_image(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_prompt_input() -> Vec<String> {
    strings(&[
        "#prompt-textarea",
        "[data-testid='prompt-textarea']",
        "div[contenteditable='true']",
        "textarea",
    ])
}

fn default_submit_button() -> Vec<String> {
    strings(&[
        "[data-testid='send-button']",
        "button[aria-label='Send prompt']",
        "form button[type='submit']",
    ])
}

fn default_assistant_message() -> Vec<String> {
    strings(&[
        "[data-message-author-role='assistant']",
        "[data-testid^='conversation-turn'] .markdown",
    ])
}

fn default_generating_indicator() -> Vec<String> {
    strings(&[
        "[data-testid='stop-button']",
        "button[aria-label='Stop generating']",
    ])
}

fn default_generated_image() -> Vec<String> {
    strings(&[
        "[data-message-author-role='assistant'] img[alt*='enerated']",
        "[data-testid='generated-image'] img",
        "[data-message-author-role='assistant'] img",
    ])
}

fn default_full_size_trigger() -> Vec<String> {
    strings(&[
        "button[aria-label='View full size']",
        "[data-testid='image-expand']",
    ])
}

fn default_full_size_image() -> Vec<String> {
    strings(&["[role='dialog'] img", "[data-testid='lightbox'] img"])
}

/// A deterministic rewrite from a thumbnail address to its full-size
/// variant. `replacement` uses `regex` expansion syntax (`$1`, `${name}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub pattern: String,
    pub replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Image resolution chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Data attributes known to carry the full-size source.
    #[serde(default = "default_full_size_attributes")]
    pub full_size_attributes: Vec<String>,

    /// Tried in order; the first that matches and changes the URL wins.
    #[serde(default = "default_rewrite_rules")]
    pub rewrite_rules: Vec<RewriteRule>,

    /// Bounded wait for locating the generated image and for the attribute
    /// lookup. URL rewriting does not wait.
    #[serde(default = "default_strategy_wait_ms")]
    pub strategy_wait_ms: u64,

    /// Bounded wait for the full-size view to materialize.
    #[serde(default = "default_interaction_wait_ms")]
    pub interaction_wait_ms: u64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            full_size_attributes: default_full_size_attributes(),
            rewrite_rules: default_rewrite_rules(),
            strategy_wait_ms: default_strategy_wait_ms(),
            interaction_wait_ms: default_interaction_wait_ms(),
        }
    }
}

fn default_full_size_attributes() -> Vec<String> {
    strings(&["data-full-src", "data-original-src", "data-fullsize"])
}

fn default_rewrite_rules() -> Vec<RewriteRule> {
    vec![
        RewriteRule::new(r"^(.+?)_thumb(\.[A-Za-z0-9]+)(\?.*)?$", "${1}${2}"),
        RewriteRule::new(r"^(https?://[^?#]+)\?(?:[^#]*&)?(?:w|width|size)=\d+[^#]*$", "${1}"),
    ]
}

fn default_strategy_wait_ms() -> u64 {
    2_000
}

fn default_interaction_wait_ms() -> u64 {
    4_000
}
