//! Image download.

use chrono::Utc;
use pagepilot_protocol::{
    Action, ActionOutcome, ChatId, CommandResult, DomainEvent, ErrorKind, Image, ImageId,
    ImageResolution, MessageId, ResolutionStrategy,
};
use tracing::{info, warn};

use super::{unexpected, Coordinator};
use crate::error::CoordinatorError;

impl Coordinator {
    /// Resolve the chat's newest generated image and record it.
    ///
    /// When the page yields no reference at all but the image message
    /// carries an attachment URL, a degraded Image is built from it.
    pub(super) async fn download_image(&self, chat_id: ChatId) -> Result<CommandResult, CoordinatorError> {
        let (message_id, known_url) = {
            let store = self.store.lock().await;
            let chat = store
                .chat(&chat_id)
                .ok_or_else(|| CoordinatorError::not_found("chat", &chat_id))?;
            let message_id = chat
                .last_image_message_id
                .clone()
                .ok_or_else(|| CoordinatorError::NotFound(format!("no image in chat {}", chat_id)))?;
            let known_url = store
                .message(&chat_id, &message_id)
                .and_then(|m| m.content.attachments.first().cloned());
            (message_id, known_url)
        };

        let _guard = self.lock_chat(&chat_id)?;

        let extracted = {
            let _page = self.page.lock().await;
            self.link
                .dispatch(Action::ExtractImage {
                    known_url: known_url.clone(),
                })
                .await
        };

        let image = match extracted {
            Ok(ActionOutcome::Image(resolution)) => resolved_image(&chat_id, &message_id, resolution),
            Ok(other) => return Err(unexpected("Image", other)),
            Err(CoordinatorError::Automation(body)) if body.kind == ErrorKind::ResolutionFailed => {
                let Some(url) = known_url else {
                    return Err(CoordinatorError::Automation(body));
                };
                warn!(%chat_id, "Resolution failed, keeping attachment URL: {}", body.message);
                degraded_image(&chat_id, &message_id, url)
            }
            Err(e) => return Err(e),
        };

        let image = self
            .store
            .lock()
            .await
            .add_image(image)
            .await?
            .ok_or_else(|| CoordinatorError::not_found("chat", &chat_id))?;

        if image.degraded {
            warn!(%chat_id, image_id = %image.id, "Image recorded at lower fidelity");
        } else {
            info!(%chat_id, image_id = %image.id, strategy = ?image.strategy, "Image recorded");
        }
        self.events.emit(DomainEvent::ImageCreated {
            chat_id: chat_id.clone(),
            image_id: image.id.clone(),
            degraded: image.degraded,
        });
        Ok(CommandResult::Image(image))
    }
}

fn resolved_image(chat_id: &ChatId, source: &MessageId, resolution: ImageResolution) -> Image {
    let id = ImageId::new();
    Image {
        filename: Image::filename_for(&resolution.resolved_url, &id),
        id,
        chat_id: chat_id.clone(),
        source_message_id: source.clone(),
        original_url: resolution.original_url,
        resolved_url: Some(resolution.resolved_url),
        fetched_at: Utc::now(),
        degraded: resolution.degraded,
        strategy: Some(resolution.strategy),
    }
}

fn degraded_image(chat_id: &ChatId, source: &MessageId, url: String) -> Image {
    let id = ImageId::new();
    Image {
        filename: Image::filename_for(&url, &id),
        id,
        chat_id: chat_id.clone(),
        source_message_id: source.clone(),
        resolved_url: Some(url.clone()),
        original_url: url,
        fetched_at: Utc::now(),
        degraded: true,
        strategy: Some(ResolutionStrategy::RawFallback),
    }
}
