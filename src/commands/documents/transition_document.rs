use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseTransaction, IntoActiveModel};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{find_items, lock_document, DocumentWithItems};
use crate::{
    commands::{
        inventory::{apply_stock_delta, StockDelta},
        Command,
    },
    db::{with_transaction, DbPool},
    entities::{
        document::{self, DocumentKind, DocumentStatus},
        stock_movement::MovementType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    services::document_lifecycle::{self, DocumentAction},
};

/// Applies one lifecycle action to a document.
///
/// The transition table is consulted again against the row read inside the
/// transaction. Verifying an import books every line into the import's
/// warehouse in the same transaction.
#[derive(Debug, Clone)]
pub struct TransitionDocumentCommand {
    pub kind: DocumentKind,
    pub document_id: Uuid,
    pub action: DocumentAction,
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransitionOutcome {
    pub from: DocumentStatus,
    pub to: DocumentStatus,
    #[serde(flatten)]
    pub document: DocumentWithItems,
    /// Lines booked into stock; only set when an import was verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_lines_received: Option<usize>,
}

#[async_trait]
impl Command for TransitionDocumentCommand {
    type Result = TransitionOutcome;

    #[instrument(skip(self, db_pool, event_sender), fields(kind = %self.kind, action = %self.action))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let command = self.clone();
        let outcome = with_transaction(&db_pool, move |txn| {
            Box::pin(async move { command.apply(txn).await })
        })
        .await
        .map_err(|e| {
            error!(
                document_id = %self.document_id,
                action = %self.action,
                error = %e,
                "Document transition failed"
            );
            metrics::record_failure("transition_document", &e);
            e
        })?;

        event_sender
            .send_or_log(Event::DocumentStatusChanged {
                document_id: self.document_id,
                kind: self.kind,
                from: outcome.from,
                to: outcome.to,
                actor_id: self.actor_id,
            })
            .await;

        if let (Some(line_count), Some(warehouse_id)) = (
            outcome.stock_lines_received,
            outcome.document.document.warehouse_id,
        ) {
            event_sender
                .send_or_log(Event::StockReceived {
                    import_id: self.document_id,
                    warehouse_id,
                    line_count,
                })
                .await;
        }

        metrics::DOCUMENT_TRANSITIONS
            .with_label_values(&[&self.kind.to_string(), &self.action.to_string()])
            .inc();
        info!(
            document_id = %self.document_id,
            from = %outcome.from,
            to = %outcome.to,
            "Document status changed"
        );

        Ok(outcome)
    }
}

impl TransitionDocumentCommand {
    async fn apply(&self, txn: &DatabaseTransaction) -> Result<TransitionOutcome, ServiceError> {
        let existing = lock_document(txn, self.kind, self.document_id).await?;
        let from = existing.status;
        let to = document_lifecycle::transition(self.kind, from, self.action)?;

        let items = find_items(txn, self.document_id).await?;
        let stock_lines_received =
            if self.kind == DocumentKind::Import && self.action == DocumentAction::Verify {
                Some(receive_import(txn, &existing, &items).await?)
            } else {
                None
            };

        let mut active = existing.into_active_model();
        active.status = Set(to);
        active.updated_at = Set(Utc::now());
        let document = active.update(txn).await?;

        Ok(TransitionOutcome {
            from,
            to,
            document: DocumentWithItems { document, items },
            stock_lines_received,
        })
    }
}

async fn receive_import(
    txn: &DatabaseTransaction,
    import: &document::Model,
    items: &[crate::entities::document_item::Model],
) -> Result<usize, ServiceError> {
    let warehouse_id = import.warehouse_id.ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "import {} has no receiving warehouse",
            import.number
        ))
    })?;

    let now = Utc::now();
    for item in items {
        apply_stock_delta(
            txn,
            StockDelta {
                warehouse_id,
                product_id: item.product_id,
                delta: item.quantity,
                movement_type: MovementType::ImportReceipt,
                reference_id: import.id,
            },
            now,
        )
        .await?;
    }
    Ok(items.len())
}
