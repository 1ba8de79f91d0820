//! In-memory [`Page`] for tests and offline runs.
//!
//! Elements declare which selector strings match them; selectors are
//! compared literally, there is no CSS engine. Reactions registered with
//! [`ScriptedPage::on_click`] / [`ScriptedPage::on_input`] mutate the model
//! to simulate the site responding, and every operation is recorded so
//! tests can assert on the order of page interactions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::page::{ElementRef, Page, PageError};

/// One element of the scripted document.
#[derive(Debug, Clone, Default)]
pub struct ScriptedElement {
    pub id: String,
    pub selectors: Vec<String>,
    pub attributes: HashMap<String, String>,
    /// Successive values returned by `text()`; the last one repeats.
    pub texts: Vec<String>,
    pub reads: usize,
    pub enabled: bool,
    pub content: String,
}

impl ScriptedElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            ..Default::default()
        }
    }

    pub fn matching(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.texts = vec![text.into()];
        self
    }

    /// Text that changes on every read, e.g. a streaming reply.
    pub fn text_sequence<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.texts = texts.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn read_text(&mut self) -> Option<String> {
        if self.texts.is_empty() {
            return None;
        }
        let idx = self.reads.min(self.texts.len() - 1);
        self.reads += 1;
        Some(self.texts[idx].clone())
    }
}

/// A recorded page operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOp {
    Attribute { element: String, name: String },
    Text { element: String },
    SetContent { element: String, text: String },
    DispatchInput { element: String },
    Click { element: String },
    PressKey { key: String },
}

/// Mutable document handed to reactions.
#[derive(Debug, Default)]
pub struct PageModel {
    elements: Vec<ScriptedElement>,
}

impl PageModel {
    pub fn insert(&mut self, element: ScriptedElement) {
        self.elements.push(element);
    }

    pub fn remove(&mut self, id: &str) {
        self.elements.retain(|e| e.id != id);
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ScriptedElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn enable(&mut self, id: &str) {
        if let Some(e) = self.get_mut(id) {
            e.enabled = true;
        }
    }

    fn resolve(&mut self, element: &ElementRef) -> Result<&mut ScriptedElement, PageError> {
        self.elements
            .iter_mut()
            .filter(|e| e.selectors.iter().any(|s| s == &element.selector))
            .nth(element.index)
            .ok_or_else(|| PageError::Detached(element.to_string()))
    }
}

type Reaction = Arc<dyn Fn(&mut PageModel) + Send + Sync>;

#[derive(Default)]
struct Reactions {
    click: HashMap<String, Vec<Reaction>>,
    input: HashMap<String, Vec<Reaction>>,
    key: HashMap<String, Vec<Reaction>>,
}

/// Scripted in-memory page.
#[derive(Default)]
pub struct ScriptedPage {
    model: Mutex<PageModel>,
    reactions: Mutex<Reactions>,
    ops: Mutex<Vec<PageOp>>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, element: ScriptedElement) {
        self.model.lock().insert(element);
    }

    /// Mutate the document directly.
    pub fn with_model<R>(&self, f: impl FnOnce(&mut PageModel) -> R) -> R {
        f(&mut self.model.lock())
    }

    /// Run `reaction` every time the element `id` is clicked.
    pub fn on_click(&self, id: &str, reaction: impl Fn(&mut PageModel) + Send + Sync + 'static) {
        self.reactions
            .lock()
            .click
            .entry(id.to_string())
            .or_default()
            .push(Arc::new(reaction));
    }

    /// Run `reaction` every time input is dispatched on element `id`.
    pub fn on_input(&self, id: &str, reaction: impl Fn(&mut PageModel) + Send + Sync + 'static) {
        self.reactions
            .lock()
            .input
            .entry(id.to_string())
            .or_default()
            .push(Arc::new(reaction));
    }

    /// Run `reaction` every time `key` is pressed.
    pub fn on_key(&self, key: &str, reaction: impl Fn(&mut PageModel) + Send + Sync + 'static) {
        self.reactions
            .lock()
            .key
            .entry(key.to_string())
            .or_default()
            .push(Arc::new(reaction));
    }

    /// Operations performed so far.
    pub fn ops(&self) -> Vec<PageOp> {
        self.ops.lock().clone()
    }

    /// Current content of the element `id`.
    pub fn content_of(&self, id: &str) -> Option<String> {
        self.model.lock().get_mut(id).map(|e| e.content.clone())
    }

    fn record(&self, op: PageOp) {
        self.ops.lock().push(op);
    }

    fn element_id(&self, element: &ElementRef) -> Result<String, PageError> {
        Ok(self.model.lock().resolve(element)?.id.clone())
    }

    fn fire(&self, table: impl Fn(&Reactions) -> Option<&Vec<Reaction>>) {
        let reactions: Vec<Reaction> = {
            let r = self.reactions.lock();
            table(&r).cloned().unwrap_or_default()
        };
        let mut model = self.model.lock();
        for reaction in reactions {
            reaction(&mut model);
        }
    }
}

#[async_trait]
impl Page for ScriptedPage {
    async fn count(&self, selector: &str) -> Result<usize, PageError> {
        let model = self.model.lock();
        Ok(model
            .elements
            .iter()
            .filter(|e| e.selectors.iter().any(|s| s == selector))
            .count())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, PageError> {
        let (id, value) = {
            let mut model = self.model.lock();
            let e = model.resolve(element)?;
            (e.id.clone(), e.attributes.get(name).cloned())
        };
        self.record(PageOp::Attribute {
            element: id,
            name: name.to_string(),
        });
        Ok(value)
    }

    async fn text(&self, element: &ElementRef) -> Result<Option<String>, PageError> {
        let (id, text) = {
            let mut model = self.model.lock();
            let e = model.resolve(element)?;
            (e.id.clone(), e.read_text())
        };
        self.record(PageOp::Text { element: id });
        Ok(text)
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, PageError> {
        let mut model = self.model.lock();
        Ok(model.resolve(element)?.enabled)
    }

    async fn set_content(&self, element: &ElementRef, text: &str) -> Result<(), PageError> {
        let id = {
            let mut model = self.model.lock();
            let e = model.resolve(element)?;
            e.content = text.to_string();
            e.id.clone()
        };
        self.record(PageOp::SetContent {
            element: id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn dispatch_input(&self, element: &ElementRef) -> Result<(), PageError> {
        let id = self.element_id(element)?;
        self.record(PageOp::DispatchInput { element: id.clone() });
        self.fire(|r| r.input.get(&id));
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), PageError> {
        let id = self.element_id(element)?;
        self.record(PageOp::Click { element: id.clone() });
        self.fire(|r| r.click.get(&id));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), PageError> {
        self.record(PageOp::PressKey {
            key: key.to_string(),
        });
        self.fire(|r| r.key.get(key));
        Ok(())
    }
}
