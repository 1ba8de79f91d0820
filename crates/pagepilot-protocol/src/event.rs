//! Domain events emitted by the Coordinator after each mutation.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::types::{ChatId, CorrelationId, ImageId, MessageId, ProjectId, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DomainEvent {
    ProjectCreated {
        project_id: ProjectId,
        name: String,
    },
    ProjectRenamed {
        project_id: ProjectId,
        name: String,
    },
    InstructionsUpdated {
        project_id: ProjectId,
    },
    ProjectArchived {
        project_id: ProjectId,
    },
    ChatCreated {
        project_id: ProjectId,
        chat_id: ChatId,
    },
    MessageAppended {
        chat_id: ChatId,
        message_id: MessageId,
        role: Role,
    },
    MessagesEvicted {
        chat_id: ChatId,
        count: usize,
    },
    ImageCreated {
        chat_id: ChatId,
        image_id: ImageId,
        degraded: bool,
    },
    CommandFailed {
        correlation_id: CorrelationId,
        kind: ErrorKind,
    },
}
