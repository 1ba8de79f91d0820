//! Abstract page surface the automation context drives.
//!
//! Elements are addressed by `(selector, index)` and re-queried on every
//! operation. The target site re-renders freely, so holding on to a live
//! node handle across polls would go stale.

use async_trait::async_trait;
use thiserror::Error;

/// Address of one element: the `index`-th match of `selector`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub selector: String,
    pub index: usize,
}

impl ElementRef {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

impl std::fmt::Display for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.selector, self.index)
    }
}

/// Page operation errors.
#[derive(Debug, Error)]
pub enum PageError {
    /// The element disappeared between lookup and use.
    #[error("Element detached: {0}")]
    Detached(String),

    /// Script evaluation raised inside the page.
    #[error("Script error: {0}")]
    Script(String),

    /// Connection to the page failed.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Page did not answer: {0}")]
    Timeout(String),
}

impl PageError {
    /// Errors worth another poll instead of aborting the action.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Detached(_) | Self::Script(_))
    }
}

/// Operations the executor needs from a live page.
#[async_trait]
pub trait Page: Send + Sync {
    /// Number of elements matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, PageError>;

    /// Attribute value. For `src` this is the resolved current source.
    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, PageError>;

    /// Rendered text content.
    async fn text(&self, element: &ElementRef) -> Result<Option<String>, PageError>;

    /// Whether a control accepts activation.
    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, PageError>;

    /// Replace the content of an input or contenteditable element.
    async fn set_content(&self, element: &ElementRef, text: &str) -> Result<(), PageError>;

    /// Fire the input/change notifications frameworks listen for.
    async fn dispatch_input(&self, element: &ElementRef) -> Result<(), PageError>;

    async fn click(&self, element: &ElementRef) -> Result<(), PageError>;

    /// Press and release a key on the focused element (e.g. `Escape`).
    async fn press_key(&self, key: &str) -> Result<(), PageError>;
}

/// First selector of `alternatives` with at least one match, and its count.
pub async fn matching_selector(
    page: &dyn Page,
    alternatives: &[String],
) -> Result<Option<(String, usize)>, PageError> {
    for selector in alternatives {
        let count = page.count(selector).await?;
        if count > 0 {
            return Ok(Some((selector.clone(), count)));
        }
    }
    Ok(None)
}

/// First element matched by any of `alternatives`.
pub async fn first_match(
    page: &dyn Page,
    alternatives: &[String],
) -> Result<Option<ElementRef>, PageError> {
    Ok(matching_selector(page, alternatives)
        .await?
        .map(|(selector, _)| ElementRef::new(selector, 0)))
}

/// Newest (last in document order) element matched by `alternatives`.
pub async fn last_match(
    page: &dyn Page,
    alternatives: &[String],
) -> Result<Option<ElementRef>, PageError> {
    Ok(matching_selector(page, alternatives)
        .await?
        .map(|(selector, count)| ElementRef::new(selector, count - 1)))
}

/// Match count of the first matching alternative, 0 when none match.
pub async fn count_matches(page: &dyn Page, alternatives: &[String]) -> Result<usize, PageError> {
    Ok(matching_selector(page, alternatives)
        .await?
        .map(|(_, count)| count)
        .unwrap_or(0))
}

/// Map transient page errors to `Ok(None)` so a poll keeps going.
pub fn soft<T>(result: Result<T, PageError>) -> Result<Option<T>, PageError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_transient() => Ok(None),
        Err(e) => Err(e),
    }
}
