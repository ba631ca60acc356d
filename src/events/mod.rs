use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
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

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Events are only emitted after the owning transaction committed.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "dropping event");
        }
    }
}

/// Domain events published after a successful commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    DeliveryCreated {
        delivery_id: Uuid,
        customer_id: Uuid,
        charged: Decimal,
    },
    DeliveryCancelled {
        delivery_id: Uuid,
        refunded: Decimal,
    },
    DeliveryRated {
        delivery_id: Uuid,
        driver_id: Uuid,
        rating: i32,
    },
    DonationRecorded {
        ngo_id: i32,
        amount: Decimal,
    },
    FundsAdded {
        payment_method_id: Uuid,
        amount: Decimal,
    },
    BundleCreated(Uuid),
    BundleUpdated(Uuid),
    BundleDeleted(Uuid),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::DeliveryCreated { .. } => "delivery_created",
            Event::DeliveryCancelled { .. } => "delivery_cancelled",
            Event::DeliveryRated { .. } => "delivery_rated",
            Event::DonationRecorded { .. } => "donation_recorded",
            Event::FundsAdded { .. } => "funds_added",
            Event::BundleCreated(_) => "bundle_created",
            Event::BundleUpdated(_) => "bundle_updated",
            Event::BundleDeleted(_) => "bundle_deleted",
        }
    }
}

/// Drains the event channel until every sender is dropped
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        metrics::counter!("concessions.events.processed", 1, "event" => event.name());

        match &event {
            Event::DeliveryCreated {
                delivery_id,
                customer_id,
                charged,
            } => {
                info!(%delivery_id, %customer_id, %charged, "delivery created");
            }
            Event::DeliveryCancelled {
                delivery_id,
                refunded,
            } => {
                info!(%delivery_id, %refunded, "delivery cancelled");
            }
            Event::DonationRecorded { ngo_id, amount } => {
                info!(ngo_id, %amount, "donation recorded");
            }
            other => {
                info!(event = other.name(), payload = ?other, "event received");
            }
        }
    }

    info!("Event processing loop stopped");
}
