//! Project and chat lifecycle commands.

use pagepilot_protocol::{CommandResult, DomainEvent, ProjectId, DEFAULT_CHAT_TITLE};
use tracing::debug;

use super::Coordinator;
use crate::error::CoordinatorError;
use crate::validation;

impl Coordinator {
    pub(super) async fn create_project(&self, name: &str) -> Result<CommandResult, CoordinatorError> {
        let name = validation::project_name(name)?;
        let project = self.store.lock().await.create_project(name).await?;

        self.events.emit(DomainEvent::ProjectCreated {
            project_id: project.id.clone(),
            name: project.name.clone(),
        });
        Ok(CommandResult::Project(project))
    }

    pub(super) async fn update_instructions(
        &self,
        project_id: &ProjectId,
        text: String,
    ) -> Result<CommandResult, CoordinatorError> {
        validation::instructions(&text)?;
        self.require_project(project_id).await?;

        let project = self
            .store
            .lock()
            .await
            .update_project(project_id, |p| p.custom_instructions = text)
            .await?
            .ok_or_else(|| CoordinatorError::not_found("project", project_id))?;

        self.events.emit(DomainEvent::InstructionsUpdated {
            project_id: project.id.clone(),
        });
        Ok(CommandResult::Project(project))
    }

    pub(super) async fn rename_project(
        &self,
        project_id: &ProjectId,
        name: &str,
    ) -> Result<CommandResult, CoordinatorError> {
        let name = validation::project_name(name)?;
        self.require_project(project_id).await?;

        let project = self
            .store
            .lock()
            .await
            .update_project(project_id, |p| p.name = name)
            .await?
            .ok_or_else(|| CoordinatorError::not_found("project", project_id))?;

        self.events.emit(DomainEvent::ProjectRenamed {
            project_id: project.id.clone(),
            name: project.name.clone(),
        });
        Ok(CommandResult::Project(project))
    }

    /// Soft delete. Chats of an archived project stay readable.
    pub(super) async fn archive_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<CommandResult, CoordinatorError> {
        let project = self
            .store
            .lock()
            .await
            .update_project(project_id, |p| p.archived = true)
            .await?
            .ok_or_else(|| CoordinatorError::not_found("project", project_id))?;

        debug!(%project_id, "Project archived");
        self.events.emit(DomainEvent::ProjectArchived {
            project_id: project.id.clone(),
        });
        Ok(CommandResult::Project(project))
    }

    pub(super) async fn create_chat(
        &self,
        project_id: &ProjectId,
        title: Option<&str>,
    ) -> Result<CommandResult, CoordinatorError> {
        let title = validation::chat_title(title)?.unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string());
        self.require_project(project_id).await?;

        let chat = self
            .store
            .lock()
            .await
            .create_chat(project_id, title)
            .await?
            .ok_or_else(|| CoordinatorError::not_found("project", project_id))?;

        self.events.emit(DomainEvent::ChatCreated {
            project_id: project_id.clone(),
            chat_id: chat.id.clone(),
        });
        Ok(CommandResult::Chat(chat))
    }
}
