//! JavaScript snippets evaluated in the page.
//!
//! Selectors and text are embedded as JSON string literals so quotes in a
//! selector such as `[data-testid='send-button']` cannot break the script.

use serde_json::Value;

use crate::page::ElementRef;

/// Key of the marker object returned when the element is gone.
pub const MISSING_MARKER: &str = "__missing";

fn literal(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

pub fn count(selector: &str) -> String {
    format!("document.querySelectorAll({}).length", literal(selector))
}

/// Wrap `body` so it runs with `el` bound to the addressed element.
fn with_element(element: &ElementRef, body: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelectorAll({})[{}]; \
         if (!el) return {{ {}: true }}; {} }})()",
        literal(&element.selector),
        element.index,
        MISSING_MARKER,
        body
    )
}

pub fn attribute(element: &ElementRef, name: &str) -> String {
    let body = if name == "src" {
        "return el.currentSrc || el.src || el.getAttribute('src');".to_string()
    } else {
        format!("return el.getAttribute({});", literal(name))
    };
    with_element(element, &body)
}

pub fn text(element: &ElementRef) -> String {
    with_element(element, "return el.innerText ?? el.textContent;")
}

pub fn is_enabled(element: &ElementRef) -> String {
    with_element(
        element,
        "return !el.disabled && el.getAttribute('aria-disabled') !== 'true';",
    )
}

/// Set the value through the native setter so framework-controlled inputs
/// see the change; contenteditable editors get their text replaced.
pub fn set_content(element: &ElementRef, text: &str) -> String {
    let body = format!(
        "const text = {}; el.focus(); \
         if (el.isContentEditable) {{ el.textContent = text; }} \
         else {{ const setter = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value')?.set; \
         if (setter) {{ setter.call(el, text); }} else {{ el.value = text; }} }} \
         return true;",
        literal(text)
    );
    with_element(element, &body)
}

pub fn dispatch_input(element: &ElementRef) -> String {
    with_element(
        element,
        "el.dispatchEvent(new InputEvent('input', { bubbles: true })); \
         el.dispatchEvent(new Event('change', { bubbles: true })); return true;",
    )
}

pub fn click(element: &ElementRef) -> String {
    with_element(
        element,
        "el.scrollIntoView({ block: 'center' }); el.click(); return true;",
    )
}

/// Whether an evaluation result is the missing-element marker.
pub fn is_missing(value: &Value) -> bool {
    value
        .get(MISSING_MARKER)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_is_escaped() {
        let script = count("[data-testid=\"send\"]");
        assert_eq!(
            script,
            r#"document.querySelectorAll("[data-testid=\"send\"]").length"#
        );
    }

    #[test]
    fn test_element_scripts_address_index() {
        let el = ElementRef::new("img", 2);
        let script = attribute(&el, "data-full-src");
        assert!(script.contains(r#"document.querySelectorAll("img")[2]"#));
        assert!(script.contains(r#"el.getAttribute("data-full-src")"#));
        assert!(attribute(&el, "src").contains("currentSrc"));
    }

    #[test]
    fn test_prompt_text_is_literal() {
        let script = set_content(&ElementRef::new("textarea", 0), "say \"hi\"\n`now`");
        assert!(script.contains(r#"const text = "say \"hi\"\n`now`";"#));
    }

    #[test]
    fn test_missing_marker() {
        assert!(is_missing(&json!({ "__missing": true })));
        assert!(!is_missing(&json!("https://x/a.png")));
        assert!(!is_missing(&Value::Null));
    }
}
