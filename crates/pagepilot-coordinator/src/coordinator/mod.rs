//! Command handling.
//!
//! The [`Coordinator`] owns the aggregate store and answers every command
//! envelope with exactly one result envelope. Checks run in a fixed order:
//! idempotency, validation, existence, then the chat lock. Page work of
//! different chats is serialized behind a single page lease.

mod chat;
mod image;
mod project;

use std::sync::Arc;

use pagepilot_config::LimitsConfig;
use pagepilot_protocol::{
    ActionOutcome, ChatId, Command, CommandResult, DomainEvent, Envelope, ErrorBody, ErrorKind,
    ProjectId, ResultEnvelope, StateSnapshot,
};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Instrument};

use crate::error::CoordinatorError;
use crate::events::EventBus;
use crate::ledger::{Admission, OutcomeLedger};
use crate::link::AutomationLink;
use crate::locks::{ChatGuard, ChatLocks};
use crate::store::AggregateStore;

pub struct Coordinator {
    store: Mutex<AggregateStore>,
    ledger: OutcomeLedger,
    locks: ChatLocks,
    /// Held for every page interaction. Actions of different chats run
    /// against the same tab and must not interleave.
    page: Mutex<()>,
    link: AutomationLink,
    events: EventBus,
    limits: LimitsConfig,
}

impl Coordinator {
    pub fn new(store: AggregateStore, link: AutomationLink, limits: &LimitsConfig) -> Self {
        Self {
            store: Mutex::new(store),
            ledger: OutcomeLedger::new(limits.ledger_capacity),
            locks: ChatLocks::new(),
            page: Mutex::new(()),
            link,
            events: EventBus::default(),
            limits: limits.clone(),
        }
    }

    /// Subscribe to domain events emitted after each mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        self.store.lock().await.snapshot()
    }

    /// Whether a chat currently has an action in flight.
    pub fn is_busy(&self, chat_id: &ChatId) -> bool {
        self.locks.is_held(chat_id)
    }

    /// Answer one command envelope.
    ///
    /// A correlation id seen before gets the recorded reply; one still
    /// running gets the same reply once it finishes.
    pub async fn handle(&self, envelope: Envelope) -> ResultEnvelope {
        let correlation_id = envelope.correlation_id.clone();
        trace!(%correlation_id, kind = %envelope.kind, "Command received");

        match self.ledger.admit(&correlation_id) {
            Admission::Recorded(reply) => {
                debug!(%correlation_id, "Replaying recorded outcome");
                reply
            }
            Admission::Pending(rx) => {
                debug!(%correlation_id, "Duplicate of a running command");
                rx.await.unwrap_or_else(|_| {
                    ResultEnvelope::error(
                        correlation_id,
                        ErrorKind::AutomationError,
                        "original submission was abandoned",
                    )
                })
            }
            Admission::Fresh(slot) => {
                let span = info_span!("command", %correlation_id, kind = %envelope.kind);
                let reply = self.execute(envelope).instrument(span).await;
                slot.complete(&reply);
                reply
            }
        }
    }

    async fn execute(&self, envelope: Envelope) -> ResultEnvelope {
        let correlation_id = envelope.correlation_id.clone();
        let result = match envelope.open::<Command>() {
            Ok(command) => {
                let name = command.name();
                let chat_id = command.chat_id().cloned();
                let result = self.run(command).await;
                if result.is_ok() {
                    info!(command = name, chat_id = ?chat_id, "Command completed");
                }
                result
            }
            Err(e) => Err(CoordinatorError::from(e)),
        };

        let failure = match result {
            Ok(result) => match ResultEnvelope::ok(correlation_id.clone(), &result) {
                Ok(reply) => return reply,
                Err(e) => CoordinatorError::from(e),
            },
            Err(e) => e,
        };

        let body = failure.to_error_body();
        warn!(kind = %body.kind, "Command failed: {}", body.message);
        self.events.emit(DomainEvent::CommandFailed {
            correlation_id: correlation_id.clone(),
            kind: body.kind,
        });
        ResultEnvelope::error(correlation_id, body.kind, body.message)
    }

    async fn run(&self, command: Command) -> Result<CommandResult, CoordinatorError> {
        match command {
            Command::CreateProject { name } => self.create_project(&name).await,
            Command::UpdateInstructions { project_id, text } => {
                self.update_instructions(&project_id, text).await
            }
            Command::CreateChat { project_id, title } => {
                self.create_chat(&project_id, title.as_deref()).await
            }
            Command::SendPrompt { chat_id, text } => self.send_prompt(chat_id, text).await,
            Command::RequestImage {
                chat_id,
                prompt,
                style,
            } => self.request_image(chat_id, &prompt, style.as_deref()).await,
            Command::DownloadImage { chat_id } => self.download_image(chat_id).await,
            Command::RenameProject { project_id, name } => {
                self.rename_project(&project_id, &name).await
            }
            Command::ArchiveProject { project_id } => self.archive_project(&project_id).await,
            Command::CheckInterface {} => self.check_interface().await,
            Command::Snapshot {} => Ok(CommandResult::Snapshot(self.snapshot().await)),
        }
    }

    /// Serve command envelopes until the channel closes or `shutdown` fires.
    ///
    /// Commands run concurrently; replies are sent as each one finishes.
    pub async fn serve(
        self: Arc<Self>,
        mut commands: mpsc::Receiver<Envelope>,
        replies: mpsc::Sender<ResultEnvelope>,
        shutdown: CancellationToken,
    ) {
        info!("Coordinator started");
        loop {
            let envelope = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = commands.recv() => match next {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let coordinator = self.clone();
            let replies = replies.clone();
            tokio::spawn(async move {
                let reply = coordinator.handle(envelope).await;
                if replies.send(reply).await.is_err() {
                    debug!("Reply receiver dropped");
                }
            });
        }
        info!("Coordinator stopped");
    }

    async fn require_project(&self, project_id: &ProjectId) -> Result<(), CoordinatorError> {
        let store = self.store.lock().await;
        match store.project(project_id) {
            Some(project) if project.archived => Err(CoordinatorError::NotFound(format!(
                "project {} is archived",
                project_id
            ))),
            Some(_) => Ok(()),
            None => Err(CoordinatorError::not_found("project", project_id)),
        }
    }

    async fn require_chat(&self, chat_id: &ChatId) -> Result<(), CoordinatorError> {
        if self.store.lock().await.chat(chat_id).is_none() {
            return Err(CoordinatorError::not_found("chat", chat_id));
        }
        Ok(())
    }

    fn lock_chat(&self, chat_id: &ChatId) -> Result<ChatGuard<'_>, CoordinatorError> {
        self.locks
            .try_acquire(chat_id)
            .ok_or_else(|| CoordinatorError::Busy(chat_id.clone()))
    }
}

/// An outcome of the wrong shape for the action that was sent.
fn unexpected(expected: &str, outcome: ActionOutcome) -> CoordinatorError {
    CoordinatorError::Automation(ErrorBody::new(
        ErrorKind::AutomationError,
        format!("expected {} outcome, got {:?}", expected, outcome),
    ))
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
