use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted by the engine after a movement or reservation
/// transition commits. Consumers must tolerate at-most-once delivery; the
/// ledger, not the event stream, is the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockRestocked {
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        transaction_id: Uuid,
    },
    StockSold {
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        transaction_id: Uuid,
    },
    StockAdjusted {
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity_delta: i64,
        reason: String,
        transaction_id: Uuid,
    },
    ReservationCreated {
        reservation_id: Uuid,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i64,
    },
    ReservationConfirmed {
        reservation_id: Uuid,
    },
    ReservationReleased {
        reservation_id: Uuid,
    },
    ReservationExpired {
        reservation_id: Uuid,
    },
}

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

/// Consumes events until every sender is dropped. Run this on its own task.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockRestocked {
                warehouse_id,
                product_id,
                quantity,
                transaction_id,
            } => {
                info!(
                    warehouse_id = %warehouse_id,
                    product_id = %product_id,
                    quantity = %quantity,
                    transaction_id = %transaction_id,
                    "Stock restocked"
                );
            }
            Event::StockSold {
                warehouse_id,
                product_id,
                quantity,
                transaction_id,
            } => {
                info!(
                    warehouse_id = %warehouse_id,
                    product_id = %product_id,
                    quantity = %quantity,
                    transaction_id = %transaction_id,
                    "Stock sold"
                );
            }
            Event::StockAdjusted {
                warehouse_id,
                product_id,
                quantity_delta,
                reason,
                transaction_id,
            } => {
                info!(
                    warehouse_id = %warehouse_id,
                    product_id = %product_id,
                    quantity_delta = %quantity_delta,
                    reason = %reason,
                    transaction_id = %transaction_id,
                    "Stock adjusted"
                );
            }
            Event::ReservationCreated {
                reservation_id,
                warehouse_id,
                product_id,
                quantity,
            } => {
                info!(
                    reservation_id = %reservation_id,
                    warehouse_id = %warehouse_id,
                    product_id = %product_id,
                    quantity = %quantity,
                    "Reservation created"
                );
            }
            Event::ReservationConfirmed { reservation_id } => {
                info!(reservation_id = %reservation_id, "Reservation confirmed");
            }
            Event::ReservationReleased { reservation_id } => {
                info!(reservation_id = %reservation_id, "Reservation released");
            }
            Event::ReservationExpired { reservation_id } => {
                info!(reservation_id = %reservation_id, "Reservation expired");
            }
        }
    }

    info!("Event processing loop stopped");
}
