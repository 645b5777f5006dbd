use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter,
};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{
    compute_totals, ensure_parties, ensure_products_exist, insert_items, lock_document,
    DocumentPayload, DocumentWithItems, Parties,
};
use crate::{
    commands::Command,
    db::{with_transaction, DbPool},
    entities::{document::DocumentKind, document_item},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    services::{document_lifecycle, totals::PricingTerms},
};

/// Replaces the header and the complete line-item set of an editable
/// document.
///
/// All existing lines are deleted and the submitted ones inserted in order
/// inside one transaction, together with the recomputed totals. Two
/// concurrent replaces serialize on the transaction: the survivor's set is
/// stored whole.
#[derive(Debug, Clone)]
pub struct ReplaceDocumentItemsCommand {
    pub kind: DocumentKind,
    pub document_id: Uuid,
    pub payload: DocumentPayload,
}

#[async_trait]
impl Command for ReplaceDocumentItemsCommand {
    type Result = DocumentWithItems;

    #[instrument(skip(self, db_pool, event_sender), fields(kind = %self.kind, document_id = %self.document_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.payload.check()?;

        let command = self.clone();
        let updated = with_transaction(&db_pool, move |txn| {
            Box::pin(async move { command.replace(txn).await })
        })
        .await
        .map_err(|e| {
            error!(
                document_id = %self.document_id,
                error = %e,
                "Transaction failed while replacing document items"
            );
            metrics::record_failure("replace_document_items", &e);
            e
        })?;

        event_sender
            .send_or_log(Event::DocumentItemsReplaced {
                document_id: self.document_id,
                kind: self.kind,
                item_count: updated.items.len(),
                total: updated.document.total,
            })
            .await;

        metrics::DOCUMENT_ITEM_REPLACEMENTS
            .with_label_values(&[&self.kind.to_string()])
            .inc();
        info!(
            document_id = %self.document_id,
            items = updated.items.len(),
            total = %updated.document.total,
            "Document items replaced"
        );

        Ok(updated)
    }
}

impl ReplaceDocumentItemsCommand {
    async fn replace(&self, txn: &DatabaseTransaction) -> Result<DocumentWithItems, ServiceError> {
        let existing = lock_document(txn, self.kind, self.document_id).await?;
        document_lifecycle::ensure_editable(self.kind, existing.status)?;

        let payload = &self.payload;
        let parties = Parties {
            branch_id: existing.branch_id,
            customer_id: payload.customer_id.or(existing.customer_id),
            supplier_id: payload.supplier_id.or(existing.supplier_id),
            warehouse_id: payload.warehouse_id.or(existing.warehouse_id),
        };
        ensure_parties(txn, parties).await?;
        ensure_products_exist(txn, &payload.items).await?;

        let terms = PricingTerms {
            apply_tax: payload.apply_tax.unwrap_or(existing.apply_tax),
            tax_rate: payload.tax_rate.unwrap_or(existing.tax_rate),
            exchange_rate: payload.exchange_rate.unwrap_or(existing.exchange_rate),
        };
        let totals = compute_totals(self.kind, payload, &terms)?;

        document_item::Entity::delete_many()
            .filter(document_item::Column::DocumentId.eq(self.document_id))
            .exec(txn)
            .await?;
        let now = Utc::now();

        let currency = payload
            .currency
            .as_ref()
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| existing.currency.clone());
        let notes = payload.notes.clone().or_else(|| existing.notes.clone());

        let mut document = existing.into_active_model();
        document.customer_id = Set(parties.customer_id);
        document.supplier_id = Set(parties.supplier_id);
        document.warehouse_id = Set(parties.warehouse_id);
        document.currency = Set(currency);
        document.exchange_rate = Set(terms.exchange_rate);
        document.apply_tax = Set(terms.apply_tax);
        document.tax_rate = Set(terms.tax_rate);
        document.notes = Set(notes);
        document.subtotal = Set(totals.subtotal);
        document.tax_amount = Set(totals.tax_amount);
        document.total = Set(totals.total);
        document.updated_at = Set(now);
        let document = document.update(txn).await?;

        let items =
            insert_items(txn, self.document_id, &payload.items, &totals.line_totals, now).await?;

        Ok(DocumentWithItems { document, items })
    }
}
