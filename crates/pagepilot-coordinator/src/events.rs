//! Domain event fan-out to UI subscribers.

use pagepilot_protocol::DomainEvent;
use tokio::sync::broadcast;
use tracing::trace;

pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers. Events with no subscriber are dropped.
    pub fn emit(&self, event: DomainEvent) {
        trace!(?event, "Domain event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_protocol::ProjectId;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let event = DomainEvent::ProjectArchived {
            project_id: ProjectId::from("p-1"),
        };

        bus.emit(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_emit_without_subscribers() {
        EventBus::new(4).emit(DomainEvent::ProjectArchived {
            project_id: ProjectId::from("p-1"),
        });
    }
}
