//! Persisted layout: one record per project.

use serde::{Deserialize, Serialize};

use super::aggregate::{Chat, Image, Message, Project};
use super::ids::ProjectId;

/// Key of the index listing project ids in creation order.
pub const PROJECT_INDEX_KEY: &str = "projects";

/// Key under which a project's record is stored.
pub fn project_key(id: &ProjectId) -> String {
    format!("project:{}", id)
}

/// A project together with everything it embeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub project: Project,
    #[serde(default)]
    pub chats: Vec<Chat>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Full state handed to a UI on rehydration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub projects: Vec<ProjectRecord>,
}

impl StateSnapshot {
    pub fn project(&self, id: &ProjectId) -> Option<&ProjectRecord> {
        self.projects.iter().find(|r| &r.project.id == id)
    }
}
