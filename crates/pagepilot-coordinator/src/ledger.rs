//! Command outcome ledger.
//!
//! Remembers the reply for every correlation id so a resubmitted command is
//! answered from the record instead of running again. A duplicate that
//! arrives while the original is still running waits for the same reply.

use std::collections::{HashMap, VecDeque};

use pagepilot_protocol::{CorrelationId, ResultEnvelope};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

enum Entry {
    InFlight(Vec<oneshot::Sender<ResultEnvelope>>),
    Completed(ResultEnvelope),
}

#[derive(Default)]
struct LedgerState {
    entries: HashMap<CorrelationId, Entry>,
    /// Completed ids, oldest first.
    completed: VecDeque<CorrelationId>,
}

/// What to do with an incoming correlation id.
pub enum Admission<'a> {
    /// First sighting. Run the command and complete the slot.
    Fresh(LedgerSlot<'a>),
    /// Still running elsewhere; await the shared reply.
    Pending(oneshot::Receiver<ResultEnvelope>),
    /// Already answered.
    Recorded(ResultEnvelope),
}

pub struct OutcomeLedger {
    state: Mutex<LedgerState>,
    capacity: usize,
}

impl OutcomeLedger {
    /// Ledger remembering at most `capacity` completed outcomes.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn admit(&self, id: &CorrelationId) -> Admission<'_> {
        let mut state = self.state.lock();
        match state.entries.get_mut(id) {
            Some(Entry::Completed(reply)) => Admission::Recorded(reply.clone()),
            Some(Entry::InFlight(waiters)) => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Admission::Pending(rx)
            }
            None => {
                state.entries.insert(id.clone(), Entry::InFlight(Vec::new()));
                Admission::Fresh(LedgerSlot {
                    ledger: self,
                    id: id.clone(),
                    done: false,
                })
            }
        }
    }

    /// Completed outcomes currently remembered.
    pub fn completed_len(&self) -> usize {
        self.state.lock().completed.len()
    }

    pub fn is_in_flight(&self, id: &CorrelationId) -> bool {
        matches!(self.state.lock().entries.get(id), Some(Entry::InFlight(_)))
    }

    fn complete(&self, id: &CorrelationId, reply: &ResultEnvelope) {
        let waiters = {
            let mut state = self.state.lock();
            let previous = state
                .entries
                .insert(id.clone(), Entry::Completed(reply.clone()));
            state.completed.push_back(id.clone());

            while state.completed.len() > self.capacity {
                if let Some(oldest) = state.completed.pop_front() {
                    trace!(correlation_id = %oldest, "Evicting recorded outcome");
                    state.entries.remove(&oldest);
                }
            }

            match previous {
                Some(Entry::InFlight(waiters)) => waiters,
                _ => Vec::new(),
            }
        };

        if !waiters.is_empty() {
            debug!(correlation_id = %id, duplicates = waiters.len(), "Answering duplicates");
        }
        for waiter in waiters {
            let _ = waiter.send(reply.clone());
        }
    }

    /// Forget an in-flight id whose command never produced a reply.
    ///
    /// Dropping the waiters' senders wakes them with a receive error.
    fn abandon(&self, id: &CorrelationId) {
        let mut state = self.state.lock();
        if matches!(state.entries.get(id), Some(Entry::InFlight(_))) {
            state.entries.remove(id);
        }
    }
}

/// Exclusive right to produce the reply for one correlation id.
///
/// Dropping the slot without completing it frees the id for a retry.
pub struct LedgerSlot<'a> {
    ledger: &'a OutcomeLedger,
    id: CorrelationId,
    done: bool,
}

impl LedgerSlot<'_> {
    /// Record `reply` and hand it to every waiting duplicate.
    pub fn complete(mut self, reply: &ResultEnvelope) {
        self.ledger.complete(&self.id, reply);
        self.done = true;
    }
}

impl Drop for LedgerSlot<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.ledger.abandon(&self.id);
        }
    }
}
