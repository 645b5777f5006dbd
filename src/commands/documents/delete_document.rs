use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, ModelTrait, QueryFilter};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::lock_document;
use crate::{
    commands::Command,
    db::{with_transaction, DbPool},
    entities::{document::DocumentKind, document_item},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    services::document_lifecycle,
};

/// Deletes a document and its lines. Only editable or cancelled documents
/// can be deleted.
#[derive(Debug, Clone)]
pub struct DeleteDocumentCommand {
    pub kind: DocumentKind,
    pub document_id: Uuid,
}

#[async_trait]
impl Command for DeleteDocumentCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(kind = %self.kind, document_id = %self.document_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let command = self.clone();
        with_transaction(&db_pool, move |txn| {
            Box::pin(async move { command.delete(txn).await })
        })
        .await
        .map_err(|e| {
            error!(document_id = %self.document_id, error = %e, "Failed to delete document");
            metrics::record_failure("delete_document", &e);
            e
        })?;

        event_sender
            .send_or_log(Event::DocumentDeleted {
                document_id: self.document_id,
                kind: self.kind,
            })
            .await;

        metrics::DOCUMENTS_DELETED
            .with_label_values(&[&self.kind.to_string()])
            .inc();
        info!(document_id = %self.document_id, "Document deleted");
        Ok(())
    }
}

impl DeleteDocumentCommand {
    async fn delete(&self, txn: &DatabaseTransaction) -> Result<(), ServiceError> {
        let existing = lock_document(txn, self.kind, self.document_id).await?;
        document_lifecycle::ensure_deletable(self.kind, existing.status)?;

        document_item::Entity::delete_many()
            .filter(document_item::Column::DocumentId.eq(self.document_id))
            .exec(txn)
            .await?;
        existing.delete(txn).await?;
        Ok(())
    }
}
