//! Automation context endpoint.
//!
//! Receives action envelopes, runs them one after another against the
//! attached page and answers every one with a result envelope carrying the
//! same correlation id.

use std::sync::Arc;

use pagepilot_protocol::{Action, Envelope, ErrorKind, ResultEnvelope};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::AutomationFailure;
use crate::executor::ActionExecutor;
use crate::page::Page;

pub struct AutomationService {
    executor: ActionExecutor,
    page: Arc<dyn Page>,
}

impl AutomationService {
    pub fn new(executor: ActionExecutor, page: Arc<dyn Page>) -> Self {
        Self { executor, page }
    }

    /// Execute one action envelope.
    pub async fn handle(&self, envelope: Envelope) -> ResultEnvelope {
        let correlation_id = envelope.correlation_id.clone();

        let action: Action = match envelope.open() {
            Ok(action) => action,
            Err(e) => {
                warn!(%correlation_id, kind = %envelope.kind, "Rejecting action: {}", e);
                let failure = AutomationFailure::Unsupported(e.to_string());
                return ResultEnvelope::error(correlation_id, failure.kind(), failure.to_string());
            }
        };

        let class = action.class();
        let span = info_span!("action", %correlation_id, %class);
        let result = self
            .executor
            .execute(self.page.as_ref(), action)
            .instrument(span)
            .await;

        match result {
            Ok(outcome) => {
                debug!(%correlation_id, %class, "Action completed");
                ResultEnvelope::ok(correlation_id.clone(), &outcome).unwrap_or_else(|e| {
                    ResultEnvelope::error(correlation_id, ErrorKind::AutomationError, e.to_string())
                })
            }
            Err(failure) => {
                warn!(%correlation_id, %class, "Action failed: {}", failure);
                let body = failure.into_error_body();
                ResultEnvelope::error(correlation_id, body.kind, body.message)
            }
        }
    }

    /// Serve actions until the channel closes or `shutdown` fires.
    pub async fn serve(
        self,
        mut actions: mpsc::Receiver<Envelope>,
        outcomes: mpsc::Sender<ResultEnvelope>,
        shutdown: CancellationToken,
    ) {
        info!("Automation service started");
        loop {
            let envelope = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = actions.recv() => match next {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let reply = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                reply = self.handle(envelope) => reply,
            };

            if outcomes.send(reply).await.is_err() {
                debug!("Outcome receiver dropped");
                break;
            }
        }
        info!("Automation service stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{ScriptedElement, ScriptedPage};
    use pagepilot_config::Config;
    use pagepilot_protocol::{ActionOutcome, CorrelationId};

    fn service(page: ScriptedPage) -> AutomationService {
        AutomationService::new(ActionExecutor::new(&Config::default()), Arc::new(page))
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_echoes_correlation_id() {
        let page = ScriptedPage::new();
        page.insert(ScriptedElement::new("input").matching("#prompt-textarea"));
        let service = service(page);

        let id = CorrelationId::new();
        let envelope = Envelope::wrap(id.clone(), &Action::PrepareInterface {}).unwrap();
        let reply = service.handle(envelope).await;

        assert_eq!(reply.correlation_id, id);
        assert!(reply.is_ok());
        assert_eq!(
            reply.into_result::<ActionOutcome>().unwrap(),
            ActionOutcome::Ready {}
        );
    }

    #[tokio::test]
    async fn test_unknown_action_is_automation_error() {
        let service = service(ScriptedPage::new());
        let mut envelope =
            Envelope::wrap(CorrelationId::from("a-1"), &Action::PrepareInterface {}).unwrap();
        envelope.kind = "ScrollPage".to_string();

        let reply = service.handle(envelope).await;
        assert_eq!(reply.error_kind(), Some(ErrorKind::AutomationError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_serve_answers_in_order_and_stops_on_shutdown() {
        let (action_tx, action_rx) = mpsc::channel(4);
        let (outcome_tx, mut outcome_rx) = mpsc::channel(4);
        let shutdown = CancellationToken::new();

        let page = ScriptedPage::new();
        page.insert(ScriptedElement::new("input").matching("#prompt-textarea"));
        let task = tokio::spawn(service(page).serve(action_rx, outcome_tx, shutdown.clone()));

        let first = CorrelationId::from("c-1");
        let second = CorrelationId::from("c-2");
        for id in [&first, &second] {
            let envelope = Envelope::wrap(id.clone(), &Action::PrepareInterface {}).unwrap();
            action_tx.send(envelope).await.unwrap();
        }

        assert_eq!(outcome_rx.recv().await.unwrap().correlation_id, first);
        assert_eq!(outcome_rx.recv().await.unwrap().correlation_id, second);

        shutdown.cancel();
        task.await.unwrap();
    }
}
