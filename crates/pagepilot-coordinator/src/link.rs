//! Coordinator side of the automation channel.
//!
//! Every action goes out in an [`Envelope`] with a fresh correlation id and
//! is matched to its [`ResultEnvelope`] by that id. The wait is bounded by
//! the action class deadline; a reply that shows up after the wait ended is
//! logged and dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pagepilot_config::TimeoutsConfig;
use pagepilot_protocol::{Action, ActionClass, ActionOutcome, CorrelationId, Envelope, ResultEnvelope};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::error::CoordinatorError;

type PendingMap = Arc<Mutex<HashMap<CorrelationId, oneshot::Sender<ResultEnvelope>>>>;

/// Automation side of the channel pair: actions in, outcomes out.
pub struct AutomationEndpoint {
    pub actions: mpsc::Receiver<Envelope>,
    pub outcomes: mpsc::Sender<ResultEnvelope>,
}

pub struct AutomationLink {
    actions: mpsc::Sender<Envelope>,
    pending: PendingMap,
    timeouts: TimeoutsConfig,
    recv_task: tokio::task::JoinHandle<()>,
}

impl AutomationLink {
    /// Create a connected link and the endpoint an automation service reads.
    ///
    /// Must be called inside a tokio runtime.
    pub fn channel(timeouts: &TimeoutsConfig, capacity: usize) -> (Self, AutomationEndpoint) {
        let capacity = capacity.max(1);
        let (action_tx, action_rx) = mpsc::channel(capacity);
        let (outcome_tx, outcome_rx) = mpsc::channel(capacity);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let recv_task = {
            let pending = pending.clone();
            tokio::spawn(async move {
                Self::receive_loop(outcome_rx, pending).await;
            })
        };

        let link = Self {
            actions: action_tx,
            pending,
            timeouts: timeouts.clone(),
            recv_task,
        };
        let endpoint = AutomationEndpoint {
            actions: action_rx,
            outcomes: outcome_tx,
        };
        (link, endpoint)
    }

    async fn receive_loop(mut outcomes: mpsc::Receiver<ResultEnvelope>, pending: PendingMap) {
        while let Some(reply) = outcomes.recv().await {
            trace!(correlation_id = %reply.correlation_id, "Outcome received");
            let waiter = pending.lock().remove(&reply.correlation_id);
            match waiter {
                Some(tx) => {
                    let _ = tx.send(reply);
                }
                None => warn!(
                    correlation_id = %reply.correlation_id,
                    "Discarding late or unknown outcome"
                ),
            }
        }

        // Wake every waiter with a closed channel.
        pending.lock().clear();
        debug!("Automation outcome stream closed");
    }

    pub fn deadline(&self, class: ActionClass) -> Duration {
        Duration::from_millis(match class {
            ActionClass::Prepare => self.timeouts.prepare_ms,
            ActionClass::Submit => self.timeouts.submit_ms,
            ActionClass::AwaitResponse => self.timeouts.await_response_ms,
            ActionClass::ExtractImage => self.timeouts.extract_image_ms,
        })
    }

    /// Outstanding actions.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Forward `action` and wait for its outcome within the class deadline.
    pub async fn dispatch(&self, action: Action) -> Result<ActionOutcome, CoordinatorError> {
        let class = action.class();
        let deadline = self.deadline(class);
        let correlation_id = CorrelationId::new();
        let envelope = Envelope::wrap(correlation_id.clone(), &action)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(correlation_id.clone(), tx);
        let _slot = PendingSlot {
            pending: &self.pending,
            id: correlation_id.clone(),
        };

        debug!(%correlation_id, %class, "Dispatching action");
        // The deadline covers the send too; a full action queue counts
        // against it.
        let round_trip = async {
            self.actions
                .send(envelope)
                .await
                .map_err(|_| CoordinatorError::Disconnected("action channel closed".to_string()))?;
            rx.await
                .map_err(|_| CoordinatorError::Disconnected("outcome channel closed".to_string()))
        };

        let reply = match tokio::time::timeout(deadline, round_trip).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                warn!(%correlation_id, %class, "Action deadline passed");
                return Err(CoordinatorError::Timeout {
                    class,
                    timeout_ms: deadline.as_millis() as u64,
                });
            }
        };

        reply.into_result().map_err(CoordinatorError::Automation)
    }
}

impl Drop for AutomationLink {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

/// Removes the pending entry however the wait ends.
struct PendingSlot<'a> {
    pending: &'a PendingMap,
    id: CorrelationId,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.id);
    }
}
