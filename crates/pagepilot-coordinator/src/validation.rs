//! Input checks run before a command touches any aggregate.

use pagepilot_protocol::{MAX_CHAT_TITLE_CHARS, MAX_INSTRUCTIONS_CHARS, MAX_PROJECT_NAME_CHARS};

use crate::error::CoordinatorError;

/// Punctuation allowed in project names besides letters, digits and spaces.
const NAME_PUNCTUATION: &[char] = &['-', '_', '.', ',', '\'', '(', ')', '&', ':'];

/// Trimmed project name, 1..=100 chars from the allowed set.
pub fn project_name(name: &str) -> Result<String, CoordinatorError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoordinatorError::Validation(
            "project name must not be empty".to_string(),
        ));
    }
    let len = name.chars().count();
    if len > MAX_PROJECT_NAME_CHARS {
        return Err(CoordinatorError::Validation(format!(
            "project name is {} chars, limit is {}",
            len, MAX_PROJECT_NAME_CHARS
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == ' ' || NAME_PUNCTUATION.contains(c)))
    {
        return Err(CoordinatorError::Validation(format!(
            "project name contains disallowed character {:?}",
            bad
        )));
    }
    Ok(name.to_string())
}

pub fn instructions(text: &str) -> Result<(), CoordinatorError> {
    let len = text.chars().count();
    if len > MAX_INSTRUCTIONS_CHARS {
        return Err(CoordinatorError::Validation(format!(
            "instructions are {} chars, limit is {}",
            len, MAX_INSTRUCTIONS_CHARS
        )));
    }
    Ok(())
}

/// Trimmed chat title. Blank titles become `None`.
pub fn chat_title(title: Option<&str>) -> Result<Option<String>, CoordinatorError> {
    let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let len = title.chars().count();
    if len > MAX_CHAT_TITLE_CHARS {
        return Err(CoordinatorError::Validation(format!(
            "chat title is {} chars, limit is {}",
            len, MAX_CHAT_TITLE_CHARS
        )));
    }
    Ok(Some(title.to_string()))
}

pub fn prompt(text: &str, max_chars: usize) -> Result<(), CoordinatorError> {
    if text.trim().is_empty() {
        return Err(CoordinatorError::Validation(
            "prompt must not be empty".to_string(),
        ));
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(CoordinatorError::Validation(format!(
            "prompt is {} chars, limit is {}",
            len, max_chars
        )));
    }
    Ok(())
}
