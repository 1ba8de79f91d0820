//! Prompt and image-generation commands.

use pagepilot_protocol::{
    Action, ActionOutcome, ChatId, CommandResult, DomainEvent, Exchange, InterfaceStatus, Message,
    MessageContent,
};
use tracing::info;

use super::{unexpected, Coordinator};
use crate::error::CoordinatorError;
use crate::validation;

/// Prompt sent to the page for an image request.
pub(crate) fn image_prompt(prompt: &str, style: Option<&str>) -> String {
    match style.map(str::trim).filter(|s| !s.is_empty()) {
        Some(style) => format!("Generate an image: {}. Style: {}", prompt.trim(), style),
        None => format!("Generate an image: {}", prompt.trim()),
    }
}

impl Coordinator {
    pub(super) async fn send_prompt(
        &self,
        chat_id: ChatId,
        text: String,
    ) -> Result<CommandResult, CoordinatorError> {
        validation::prompt(&text, self.limits.max_prompt_chars)?;
        self.exchange(chat_id, text, false).await
    }

    pub(super) async fn request_image(
        &self,
        chat_id: ChatId,
        prompt: &str,
        style: Option<&str>,
    ) -> Result<CommandResult, CoordinatorError> {
        validation::prompt(prompt, self.limits.max_prompt_chars)?;
        self.exchange(chat_id, image_prompt(prompt, style), true).await
    }

    pub(super) async fn check_interface(&self) -> Result<CommandResult, CoordinatorError> {
        let _page = self.page.lock().await;
        match self.link.dispatch(Action::PrepareInterface {}).await? {
            ActionOutcome::Ready {} => Ok(CommandResult::Interface(InterfaceStatus { ready: true })),
            other => Err(unexpected("Ready", other)),
        }
    }

    /// Submit `text` to the page and record the prompt and its reply.
    ///
    /// Nothing is appended unless both actions succeed.
    async fn exchange(
        &self,
        chat_id: ChatId,
        text: String,
        is_image_generation: bool,
    ) -> Result<CommandResult, CoordinatorError> {
        self.require_chat(&chat_id).await?;
        let _guard = self.lock_chat(&chat_id)?;
        // The reply is read as the newest assistant message, so no other
        // chat may submit between our submit and await.
        let page = self.page.lock().await;

        let baseline = match self
            .link
            .dispatch(Action::SubmitPrompt { text: text.clone() })
            .await?
        {
            ActionOutcome::Submitted { baseline } => baseline,
            other => return Err(unexpected("Submitted", other)),
        };

        let (reply, attachments) = match self.link.dispatch(Action::AwaitResponse { baseline }).await? {
            ActionOutcome::Response { text, attachments } => (text, attachments),
            other => return Err(unexpected("Response", other)),
        };
        drop(page);

        let user = Message::user(chat_id.clone(), text);
        let assistant = Message::assistant(
            chat_id.clone(),
            MessageContent::text(reply).with_attachments(attachments),
            is_image_generation,
        );

        let appended = self
            .store
            .lock()
            .await
            .append_exchange(&chat_id, user.clone(), assistant.clone())
            .await?
            .ok_or_else(|| CoordinatorError::not_found("chat", &chat_id))?;

        for message in [&user, &assistant] {
            self.events.emit(DomainEvent::MessageAppended {
                chat_id: chat_id.clone(),
                message_id: message.id.clone(),
                role: message.role,
            });
        }
        if appended.evicted > 0 {
            self.events.emit(DomainEvent::MessagesEvicted {
                chat_id: chat_id.clone(),
                count: appended.evicted,
            });
        }

        info!(
            %chat_id,
            reply_chars = assistant.content.text.chars().count(),
            attachments = assistant.content.attachments.len(),
            "Exchange recorded"
        );
        Ok(CommandResult::Exchange(Exchange { user, assistant }))
    }
}
