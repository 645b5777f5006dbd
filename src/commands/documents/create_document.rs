use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseTransaction, EntityTrait};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{
    compute_totals, ensure_parties, ensure_products_exist, generate_document_number,
    insert_items, DocumentPayload, DocumentWithItems, Parties,
};
use crate::{
    commands::Command,
    db::{with_transaction, DbPool},
    entities::{
        branch,
        document::{self, DocumentKind},
    },
    errors::{FieldError, ServiceError},
    events::{Event, EventSender},
    metrics,
    services::{document_lifecycle, totals::PricingTerms},
};

/// Header values used when the payload leaves them out.
#[derive(Debug, Clone)]
pub struct DocumentDefaults {
    pub currency: String,
    pub tax_rate: Decimal,
}

/// Creates a document with its first set of lines. The branch has already
/// been resolved and authorized by the caller.
#[derive(Debug, Clone)]
pub struct CreateDocumentCommand {
    pub kind: DocumentKind,
    pub branch_id: Uuid,
    pub created_by: Uuid,
    pub payload: DocumentPayload,
    pub defaults: DocumentDefaults,
}

#[async_trait]
impl Command for CreateDocumentCommand {
    type Result = DocumentWithItems;

    #[instrument(skip(self, db_pool, event_sender), fields(kind = %self.kind))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.payload.check()?;
        self.payload.check_required_parties(self.kind)?;

        let command = self.clone();
        let created = with_transaction(&db_pool, move |txn| {
            Box::pin(async move { command.insert_document(txn).await })
        })
        .await
        .map_err(|e| {
            error!(kind = %self.kind, error = %e, "Failed to create document");
            metrics::record_failure("create_document", &e);
            e
        })?;

        event_sender
            .send_or_log(Event::DocumentCreated {
                document_id: created.document.id,
                kind: self.kind,
                number: created.document.number.clone(),
                branch_id: created.document.branch_id,
            })
            .await;

        metrics::DOCUMENTS_CREATED
            .with_label_values(&[&self.kind.to_string()])
            .inc();
        info!(
            document_id = %created.document.id,
            number = %created.document.number,
            items = created.items.len(),
            "Document created"
        );

        Ok(created)
    }
}

impl CreateDocumentCommand {
    fn pricing_terms(&self) -> PricingTerms {
        let payload = &self.payload;
        PricingTerms {
            apply_tax: payload.apply_tax.unwrap_or(matches!(
                self.kind,
                DocumentKind::Quotation | DocumentKind::Invoice
            )),
            tax_rate: payload.tax_rate.unwrap_or(self.defaults.tax_rate),
            exchange_rate: payload.exchange_rate.unwrap_or(Decimal::ONE),
        }
    }

    async fn insert_document(
        &self,
        txn: &DatabaseTransaction,
    ) -> Result<DocumentWithItems, ServiceError> {
        if branch::Entity::find_by_id(self.branch_id)
            .one(txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidFields(vec![FieldError::new(
                "branch_id",
                "unknown branch",
            )]));
        }

        let payload = &self.payload;
        ensure_parties(
            txn,
            Parties {
                branch_id: self.branch_id,
                customer_id: payload.customer_id,
                supplier_id: payload.supplier_id,
                warehouse_id: payload.warehouse_id,
            },
        )
        .await?;
        ensure_products_exist(txn, &payload.items).await?;

        let now = Utc::now();
        let terms = self.pricing_terms();
        let totals = compute_totals(self.kind, payload, &terms)?;

        let document = document::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(self.kind),
            number: Set(generate_document_number(self.kind, now)),
            status: Set(document_lifecycle::initial_status(self.kind)),
            branch_id: Set(self.branch_id),
            created_by: Set(self.created_by),
            customer_id: Set(payload.customer_id),
            supplier_id: Set(payload.supplier_id),
            warehouse_id: Set(payload.warehouse_id),
            currency: Set(payload
                .currency
                .clone()
                .unwrap_or_else(|| self.defaults.currency.clone())
                .to_uppercase()),
            exchange_rate: Set(terms.exchange_rate),
            apply_tax: Set(terms.apply_tax),
            tax_rate: Set(terms.tax_rate),
            subtotal: Set(totals.subtotal),
            tax_amount: Set(totals.tax_amount),
            total: Set(totals.total),
            notes: Set(payload.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;

        let items =
            insert_items(txn, document.id, &payload.items, &totals.line_totals, now).await?;

        Ok(DocumentWithItems { document, items })
    }
}
