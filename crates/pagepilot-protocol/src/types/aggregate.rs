//! Project, Chat, Message and Image aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ChatId, ImageId, MessageId, ProjectId};
use crate::action::ResolutionStrategy;

/// Maximum project name length, in characters.
pub const MAX_PROJECT_NAME_CHARS: usize = 100;
/// Maximum custom instructions length, in characters.
pub const MAX_INSTRUCTIONS_CHARS: usize = 1500;
/// Maximum chat title length, in characters.
pub const MAX_CHAT_TITLE_CHARS: usize = 100;
/// Title given to chats created without one.
pub const DEFAULT_CHAT_TITLE: &str = "New chat";

/// A named group of chats sharing custom instructions.
///
/// Projects are never removed; archiving hides them while keeping past
/// chats resolvable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub custom_instructions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub archived: bool,
    /// Ordered set; never contains duplicates.
    #[serde(default)]
    pub chat_ids: Vec<ChatId>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            name: name.into(),
            custom_instructions: String::new(),
            created_at: now,
            updated_at: now,
            archived: false,
            chat_ids: Vec::new(),
        }
    }

    /// Attach a chat, keeping `chat_ids` duplicate free.
    ///
    /// Returns `false` when the chat was already attached.
    pub fn attach_chat(&mut self, chat_id: ChatId) -> bool {
        if self.chat_ids.contains(&chat_id) {
            return false;
        }
        self.chat_ids.push(chat_id);
        self.updated_at = Utc::now();
        true
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A conversation inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub project_id: ProjectId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub message_ids: Vec<MessageId>,
    /// Newest image-bearing message, always a member of `message_ids`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_image_message_id: Option<MessageId>,
}

impl Chat {
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            id: ChatId::new(),
            project_id,
            title: title.into(),
            created_at: Utc::now(),
            message_ids: Vec::new(),
            last_image_message_id: None,
        }
    }
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Message body: text plus optional attachment references (URLs).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Immutable log entry of a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub role: Role,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_image_generation: bool,
}

impl Message {
    pub fn user(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            chat_id,
            role: Role::User,
            content: MessageContent::text(text),
            timestamp: Utc::now(),
            is_image_generation: false,
        }
    }

    pub fn assistant(chat_id: ChatId, content: MessageContent, is_image_generation: bool) -> Self {
        Self {
            id: MessageId::new(),
            chat_id,
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
            is_image_generation,
        }
    }

    /// Image-bearing messages are the only valid `last_image_message_id`
    /// targets.
    pub fn is_image_bearing(&self) -> bool {
        self.is_image_generation
    }
}

/// A generated image extracted from a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: ImageId,
    pub chat_id: ChatId,
    pub source_message_id: MessageId,
    pub original_url: String,
    /// High-resolution address. Equals `original_url` when degraded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_url: Option<String>,
    pub filename: String,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ResolutionStrategy>,
}

impl Image {
    /// Best URL to download from.
    pub fn download_url(&self) -> &str {
        self.resolved_url.as_deref().unwrap_or(&self.original_url)
    }

    /// Derive a file name from the last path segment of `url`.
    ///
    /// Falls back to `image-{id}.png` when the URL has no usable segment.
    pub fn filename_for(url: &str, id: &ImageId) -> String {
        let segment = url::Url::parse(url).ok().and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.next_back().map(str::to_string))
                .filter(|s| !s.is_empty())
        });

        let Some(segment) = segment else {
            return format!("image-{}.png", id);
        };

        let sanitized: String = segment
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if sanitized.contains('.') {
            sanitized
        } else {
            format!("{}.png", sanitized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_chat_rejects_duplicates() {
        let mut project = Project::new("Research");
        let chat = ChatId::new();
        assert!(project.attach_chat(chat.clone()));
        assert!(!project.attach_chat(chat));
        assert_eq!(project.chat_ids.len(), 1);
    }

    #[test]
    fn test_filename_from_url() {
        let id = ImageId::from("i1");
        assert_eq!(
            Image::filename_for("https://cdn.example.com/files/sunset.webp?w=256", &id),
            "sunset.webp"
        );
        assert_eq!(
            Image::filename_for("https://cdn.example.com/files/abc%20def", &id),
            "abc_20def.png"
        );
        assert_eq!(Image::filename_for("not a url", &id), "image-i1.png");
        assert_eq!(Image::filename_for("https://cdn.example.com/", &id), "image-i1.png");
    }

    #[test]
    fn test_message_serializes_camel_case() {
        let msg = Message::assistant(
            ChatId::from("c1"),
            MessageContent::text("here you go").with_attachments(vec!["https://x/y.png".into()]),
            true,
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["chatId"], "c1");
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["isImageGeneration"], true);
        assert_eq!(json["content"]["attachments"][0], "https://x/y.png");
    }
}
