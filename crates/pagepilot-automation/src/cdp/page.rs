//! [`Page`] backed by a live Chrome tab.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::CdpClient;
use super::error::CdpError;
use super::protocol::KeyEventType;
use super::script;
use crate::page::{ElementRef, Page, PageError};

/// One attached tab of the target site.
pub struct CdpPage {
    client: Arc<CdpClient>,
    session_id: String,
    target_id: String,
}

impl CdpPage {
    /// Attach to the first open tab of `target_url`.
    pub async fn attach(client: Arc<CdpClient>, target_url: &str) -> Result<Self, CdpError> {
        let info = client.find_page(target_url).await?;
        let session_id = client.attach(&info.id).await?;
        info!(target = %info.id, url = %info.url, "Attached to page");

        Ok(Self {
            client,
            session_id,
            target_id: info.id,
        })
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .client
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                })),
                Some(&self.session_id),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["text"].as_str().unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Evaluate an element script, turning the missing marker into an error.
    async fn on_element(&self, element: &ElementRef, expression: String) -> Result<Value, PageError> {
        let value = self.evaluate(&expression).await?;
        if script::is_missing(&value) {
            return Err(CdpError::ElementMissing(element.to_string()).into());
        }
        Ok(value)
    }

    async fn key_event(&self, kind: KeyEventType, key: &str) -> Result<(), CdpError> {
        let mut params = json!({ "type": kind, "key": key, "code": key });
        if let Some(code) = virtual_key_code(key) {
            params["windowsVirtualKeyCode"] = json!(code);
        }
        self.client
            .call("Input.dispatchKeyEvent", Some(params), Some(&self.session_id))
            .await?;
        Ok(())
    }
}

fn virtual_key_code(key: &str) -> Option<u32> {
    match key {
        "Escape" => Some(27),
        "Enter" => Some(13),
        "Tab" => Some(9),
        _ => None,
    }
}

#[async_trait]
impl Page for CdpPage {
    async fn count(&self, selector: &str) -> Result<usize, PageError> {
        let value = self.evaluate(&script::count(selector)).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, PageError> {
        let value = self.on_element(element, script::attribute(element, name)).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn text(&self, element: &ElementRef) -> Result<Option<String>, PageError> {
        let value = self.on_element(element, script::text(element)).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, PageError> {
        let value = self.on_element(element, script::is_enabled(element)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn set_content(&self, element: &ElementRef, text: &str) -> Result<(), PageError> {
        self.on_element(element, script::set_content(element, text)).await?;
        debug!(%element, chars = text.chars().count(), "Set input content");
        Ok(())
    }

    async fn dispatch_input(&self, element: &ElementRef) -> Result<(), PageError> {
        self.on_element(element, script::dispatch_input(element)).await?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), PageError> {
        self.on_element(element, script::click(element)).await?;
        debug!(%element, "Clicked");
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), PageError> {
        self.key_event(KeyEventType::KeyDown, key).await?;
        self.key_event(KeyEventType::KeyUp, key).await?;
        Ok(())
    }
}
