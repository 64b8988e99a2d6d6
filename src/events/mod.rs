use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

pub mod outbox;

/// Domain events emitted by the services. Each event also has a stable wire
/// shape used for outbox webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrdersImported { orders: usize },
    SeparationCreated(Uuid),
    SeparationApproved(Uuid),
    SeparationRejected(Uuid),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::OrdersImported { .. } => "orders.imported",
            Event::SeparationCreated(_) => "separation.created",
            Event::SeparationApproved(_) => "separation.approved",
            Event::SeparationRejected(_) => "separation.rejected",
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        match self {
            Event::OrdersImported { orders } => json!({ "orders": orders }),
            Event::SeparationCreated(id)
            | Event::SeparationApproved(id)
            | Event::SeparationRejected(id) => json!({ "separation_id": id }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// In-process event loop. Durable side effects ride the outbox; this loop
/// only observes.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        crate::metrics::EVENTS_PROCESSED.inc();
        info!(event_type = event.event_type(), "domain event processed");
    }
    info!("event channel closed, stopping event processor");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_the_aggregate_id() {
        let id = Uuid::new_v4();
        let event = Event::SeparationApproved(id);
        assert_eq!(event.event_type(), "separation.approved");
        assert_eq!(event.payload()["separation_id"], json!(id));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        drop(rx);
        assert!(sender.send(Event::OrdersImported { orders: 1 }).await.is_err());
    }
}
