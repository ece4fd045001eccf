use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events emitted by the engine's services. Consumers (notification fan-out,
/// dashboards) subscribe via the processing task; sending is always
/// fire-and-forget from the mutation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockMovementApplied {
        movement_id: Uuid,
        product_id: Uuid,
        kind: String,
        quantity: Decimal,
        new_stock: Decimal,
    },
    LowStockDetected {
        product_id: Uuid,
        sku: String,
        current_stock: Decimal,
        min_stock: Decimal,
    },
    ProductionOrderCreated {
        order_id: Uuid,
        order_number: String,
        product_id: Uuid,
        quantity: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    ConsumptionRecorded {
        order_id: Uuid,
        material_id: Uuid,
        quantity: Decimal,
    },
    BatchRecorded {
        order_id: Uuid,
        batch_number: String,
        quantity_produced: Decimal,
        quality: String,
    },
    WasteRecorded {
        order_id: Uuid,
        process: String,
        quantity: Decimal,
    },
    CostingCreated {
        costing_id: Uuid,
        product_id: Uuid,
        total: Decimal,
        calculation_date: NaiveDate,
    },
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

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Mutation paths must not fail because nobody is listening.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Background task draining the event channel. Currently logs every event;
/// downstream integrations hook in here.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::LowStockDetected {
                sku,
                current_stock,
                min_stock,
                ..
            } => {
                warn!(%sku, %current_stock, %min_stock, "Product at or below minimum stock");
            }
            other => {
                debug!(event = ?other, "Event processed");
            }
        }
    }
    info!("Event processor stopped");
}
