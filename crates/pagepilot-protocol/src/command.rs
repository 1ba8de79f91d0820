//! UI → Coordinator command surface.

use serde::{Deserialize, Serialize};

use crate::types::{Chat, ChatId, Image, Message, Project, ProjectId, StateSnapshot};

/// A command issued by the UI.
///
/// Travels as `{ "type": "<Variant>", "payload": { ... } }` inside an
/// [`Envelope`](crate::Envelope). Payload fields are camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum Command {
    CreateProject {
        name: String,
    },
    UpdateInstructions {
        project_id: ProjectId,
        text: String,
    },
    CreateChat {
        project_id: ProjectId,
        #[serde(default)]
        title: Option<String>,
    },
    SendPrompt {
        chat_id: ChatId,
        text: String,
    },
    RequestImage {
        chat_id: ChatId,
        prompt: String,
        #[serde(default)]
        style: Option<String>,
    },
    DownloadImage {
        chat_id: ChatId,
    },
    RenameProject {
        project_id: ProjectId,
        name: String,
    },
    ArchiveProject {
        project_id: ProjectId,
    },
    CheckInterface {},
    Snapshot {},
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateProject { .. } => "CreateProject",
            Self::UpdateInstructions { .. } => "UpdateInstructions",
            Self::CreateChat { .. } => "CreateChat",
            Self::SendPrompt { .. } => "SendPrompt",
            Self::RequestImage { .. } => "RequestImage",
            Self::DownloadImage { .. } => "DownloadImage",
            Self::RenameProject { .. } => "RenameProject",
            Self::ArchiveProject { .. } => "ArchiveProject",
            Self::CheckInterface {} => "CheckInterface",
            Self::Snapshot {} => "Snapshot",
        }
    }

    /// Chat the command drives page actions for, if any.
    pub fn chat_id(&self) -> Option<&ChatId> {
        match self {
            Self::SendPrompt { chat_id, .. }
            | Self::RequestImage { chat_id, .. }
            | Self::DownloadImage { chat_id } => Some(chat_id),
            _ => None,
        }
    }
}

/// A prompt and the reply it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: Message,
    pub assistant: Message,
}

/// Outcome of an interface readiness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStatus {
    pub ready: bool,
}

/// Successful command result, stored in `ResultEnvelope.result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommandResult {
    Project(Project),
    Chat(Chat),
    Exchange(Exchange),
    Image(Image),
    Interface(InterfaceStatus),
    Snapshot(StateSnapshot),
}
