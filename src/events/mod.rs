use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Ledger events
    PurchaseRecorded {
        purchase_id: Uuid,
        base_id: Uuid,
        equipment_type_id: Uuid,
        quantity: i64,
    },
    AssignmentRecorded {
        assignment_id: Uuid,
        base_id: Uuid,
        equipment_type_id: Uuid,
        quantity: i64,
        kind: String,
    },
    TransferInitiated {
        transfer_id: Uuid,
        from_base_id: Uuid,
        to_base_id: Uuid,
        equipment_type_id: Uuid,
        quantity: i64,
    },
    TransferCompleted {
        transfer_id: Uuid,
        to_base_id: Uuid,
        equipment_type_id: Uuid,
        quantity: i64,
    },
    TransferCancelled {
        transfer_id: Uuid,
        from_base_id: Uuid,
        equipment_type_id: Uuid,
        quantity: i64,
    },

    // Catalog events
    BaseCreated(Uuid),
    BaseUpdated(Uuid),
    BaseDeleted(Uuid),
    EquipmentTypeCreated(Uuid),
}

impl Event {
    /// Short name used for logging and metrics labels
    pub fn name(&self) -> &'static str {
        match self {
            Event::PurchaseRecorded { .. } => "purchase_recorded",
            Event::AssignmentRecorded { .. } => "assignment_recorded",
            Event::TransferInitiated { .. } => "transfer_initiated",
            Event::TransferCompleted { .. } => "transfer_completed",
            Event::TransferCancelled { .. } => "transfer_cancelled",
            Event::BaseCreated(_) => "base_created",
            Event::BaseUpdated(_) => "base_updated",
            Event::BaseDeleted(_) => "base_deleted",
            Event::EquipmentTypeCreated(_) => "equipment_type_created",
        }
    }
}

/// Background consumer for domain events.
///
/// Downstream integrations (notifications, sync) hang off this loop; today it
/// records the stream in the application log.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        debug!(event = event.name(), payload = ?event, "Processing event");
    }
    info!("Event processor stopped; channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_the_channel_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let base_id = Uuid::new_v4();
        sender.send(Event::BaseCreated(base_id)).await.unwrap();
        sender
            .send(Event::PurchaseRecorded {
                purchase_id: Uuid::new_v4(),
                base_id,
                equipment_type_id: Uuid::new_v4(),
                quantity: 5,
            })
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().name(), "base_created");
        assert_eq!(rx.recv().await.unwrap().name(), "purchase_recorded");
    }

    #[test]
    fn event_names_are_stable() {
        assert_eq!(
            Event::TransferInitiated {
                transfer_id: Uuid::new_v4(),
                from_base_id: Uuid::new_v4(),
                to_base_id: Uuid::new_v4(),
                equipment_type_id: Uuid::new_v4(),
                quantity: 1,
            }
            .name(),
            "transfer_initiated"
        );
        assert_eq!(Event::BaseDeleted(Uuid::new_v4()).name(), "base_deleted");
    }
}
