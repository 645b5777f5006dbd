use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::document::{DocumentKind, DocumentStatus};

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

    /// Sends an event after a committed write. The write already happened, so a
    /// closed channel is logged rather than surfaced to the caller.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "domain event dropped");
        }
    }
}

/// Domain events emitted after a write commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    DocumentCreated {
        document_id: Uuid,
        kind: DocumentKind,
        number: String,
        branch_id: Uuid,
    },
    DocumentItemsReplaced {
        document_id: Uuid,
        kind: DocumentKind,
        item_count: usize,
        total: Decimal,
    },
    DocumentStatusChanged {
        document_id: Uuid,
        kind: DocumentKind,
        from: DocumentStatus,
        to: DocumentStatus,
        actor_id: Uuid,
    },
    DocumentDeleted {
        document_id: Uuid,
        kind: DocumentKind,
    },
    StockReceived {
        import_id: Uuid,
        warehouse_id: Uuid,
        line_count: usize,
    },
    StockTransferred {
        transfer_id: Uuid,
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    },
    ReferenceRecordCreated {
        entity: String,
        id: Uuid,
    },
}

/// Drains the event channel and logs every event until all senders are gone.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::DocumentCreated {
                document_id,
                kind,
                number,
                ..
            } => {
                info!(%document_id, %kind, %number, "document created");
            }
            Event::DocumentItemsReplaced {
                document_id,
                kind,
                item_count,
                total,
            } => {
                info!(%document_id, %kind, item_count, %total, "document items replaced");
            }
            Event::DocumentStatusChanged {
                document_id,
                kind,
                from,
                to,
                actor_id,
            } => {
                info!(%document_id, %kind, %from, %to, %actor_id, "document status changed");
            }
            Event::DocumentDeleted { document_id, kind } => {
                info!(%document_id, %kind, "document deleted");
            }
            Event::StockReceived {
                import_id,
                warehouse_id,
                line_count,
            } => {
                info!(%import_id, %warehouse_id, line_count, "stock received from import");
            }
            Event::StockTransferred {
                transfer_id,
                from_warehouse_id,
                to_warehouse_id,
                product_id,
                quantity,
            } => {
                info!(
                    %transfer_id,
                    %from_warehouse_id,
                    %to_warehouse_id,
                    %product_id,
                    %quantity,
                    "stock transferred"
                );
            }
            Event::ReferenceRecordCreated { entity, id } => {
                info!(%entity, %id, "reference record created");
            }
        }
    }

    warn!("Event processing loop has ended");
}
