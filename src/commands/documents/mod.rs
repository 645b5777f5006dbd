//! Document write commands and the payload types they share.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::Expr, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::{deserialize_money, deserialize_optional_money};
use crate::entities::{
    customer,
    document::{self, DocumentKind},
    document_item, product, supplier, warehouse,
};
use crate::errors::{field_errors_from, FieldError, ServiceError};
use crate::services::totals::{self, AmountOverflow, DocumentTotals, LineAmount, PricingTerms};

mod create_document;
mod delete_document;
mod replace_document_items;
mod transition_document;

pub use create_document::{CreateDocumentCommand, DocumentDefaults};
pub use delete_document::DeleteDocumentCommand;
pub use replace_document_items::ReplaceDocumentItemsCommand;
pub use transition_document::{TransitionDocumentCommand, TransitionOutcome};

/// Largest exchange rate the `NUMERIC(16, 6)` column holds.
const MAX_EXCHANGE_RATE: Decimal = dec!(9999999999.999999);

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_positive_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity <= Decimal::ZERO {
        Err(validation_error("positive", "quantity must be greater than zero"))
    } else if *quantity > totals::MAX_QUANTITY {
        Err(validation_error("max", "quantity is too large"))
    } else {
        Ok(())
    }
}

fn validate_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        Err(validation_error("non_negative", "unit price cannot be negative"))
    } else if *price > totals::MAX_AMOUNT {
        Err(validation_error("max", "unit price is too large"))
    } else {
        Ok(())
    }
}

/// One submitted line. Money fields accept numbers, numeric strings, `""`
/// and `null`; the last three read as zero.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DocumentItemInput {
    #[validate(required)]
    pub product_id: Option<Uuid>,
    #[validate(length(max = 500, message = "description is too long"))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_money")]
    #[validate(custom = "validate_positive_quantity")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "deserialize_money")]
    #[validate(custom = "validate_non_negative_price")]
    pub unit_price: Decimal,
}

/// Body of `POST` and `PUT` on every document resource. On update, header
/// fields left out keep their stored value; the item list always replaces
/// the stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct DocumentPayload {
    pub branch_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_money")]
    pub exchange_rate: Option<Decimal>,
    pub apply_tax: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_money")]
    pub tax_rate: Option<Decimal>,
    #[validate(length(max = 2000, message = "notes are too long"))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate]
    pub items: Vec<DocumentItemInput>,
}

impl DocumentPayload {
    /// Input checks that need no database access. An empty item list is
    /// rejected on its own, ahead of per-field validation.
    pub fn check(&self) -> Result<(), ServiceError> {
        if self.items.is_empty() {
            return Err(ServiceError::InvalidFields(vec![FieldError::new(
                "items",
                "at least one item is required",
            )]));
        }

        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors_from(&e),
        };
        if matches!(self.exchange_rate, Some(rate) if rate <= Decimal::ZERO || rate > MAX_EXCHANGE_RATE)
        {
            errors.push(FieldError::new(
                "exchange_rate",
                "exchange rate must be greater than zero and fit the rate column",
            ));
        }
        if matches!(self.tax_rate, Some(rate) if rate < Decimal::ZERO || rate > Decimal::ONE) {
            errors.push(FieldError::new(
                "tax_rate",
                "tax rate must be between 0 and 1",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            errors.sort_by(|a, b| a.field.cmp(&b.field));
            Err(ServiceError::InvalidFields(errors))
        }
    }

    /// Counterparties each kind must name when it is created.
    pub fn check_required_parties(&self, kind: DocumentKind) -> Result<(), ServiceError> {
        let mut errors = Vec::new();
        let needs_customer = matches!(
            kind,
            DocumentKind::Quotation | DocumentKind::Invoice | DocumentKind::DeliveryNote
        );
        let needs_supplier = kind == DocumentKind::Import;
        let needs_warehouse = matches!(kind, DocumentKind::Import | DocumentKind::DeliveryNote);

        if needs_customer && self.customer_id.is_none() {
            errors.push(FieldError::new("customer_id", "customer is required"));
        }
        if needs_supplier && self.supplier_id.is_none() {
            errors.push(FieldError::new("supplier_id", "supplier is required"));
        }
        if needs_warehouse && self.warehouse_id.is_none() {
            errors.push(FieldError::new("warehouse_id", "warehouse is required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidFields(errors))
        }
    }

    fn lines(&self) -> Vec<LineAmount> {
        self.items
            .iter()
            .map(|item| LineAmount::new(item.quantity, item.unit_price))
            .collect()
    }
}

/// A document together with its lines in stored order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentWithItems {
    pub document: document::Model,
    pub items: Vec<document_item::Model>,
}

/// Loads a document of the given kind. A document of another kind is
/// reported as missing.
pub(crate) async fn find_document<C: ConnectionTrait>(
    conn: &C,
    kind: DocumentKind,
    id: Uuid,
) -> Result<document::Model, ServiceError> {
    document::Entity::find_by_id(id)
        .filter(document::Column::Kind.eq(kind))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", kind, id)))
}

/// Same as [`find_document`] but claims the row for the rest of the
/// transaction. The no-op update comes first so that the write lock is held
/// before anything is read: Postgres takes the row lock, SQLite takes the
/// database write lock and a second writer waits for commit instead of
/// working from a stale snapshot.
pub(crate) async fn lock_document<C: ConnectionTrait>(
    conn: &C,
    kind: DocumentKind,
    id: Uuid,
) -> Result<document::Model, ServiceError> {
    let touched = document::Entity::update_many()
        .col_expr(
            document::Column::UpdatedAt,
            Expr::col(document::Column::UpdatedAt).into(),
        )
        .filter(document::Column::Id.eq(id))
        .filter(document::Column::Kind.eq(kind))
        .exec(conn)
        .await?;
    if touched.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!("{} {} not found", kind, id)));
    }

    document::Entity::find_by_id(id)
        .filter(document::Column::Kind.eq(kind))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", kind, id)))
}

pub(crate) async fn find_items<C: ConnectionTrait>(
    conn: &C,
    document_id: Uuid,
) -> Result<Vec<document_item::Model>, ServiceError> {
    Ok(document_item::Entity::find()
        .filter(document_item::Column::DocumentId.eq(document_id))
        .order_by_asc(document_item::Column::Position)
        .all(conn)
        .await?)
}

/// Counterparties a document header points at.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Parties {
    pub branch_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
}

/// Checks that every referenced customer, supplier and warehouse exists and
/// that the warehouse belongs to the document's branch.
pub(crate) async fn ensure_parties<C: ConnectionTrait>(
    conn: &C,
    parties: Parties,
) -> Result<(), ServiceError> {
    let mut errors = Vec::new();

    if let Some(id) = parties.customer_id {
        if customer::Entity::find_by_id(id).one(conn).await?.is_none() {
            errors.push(FieldError::new("customer_id", "unknown customer"));
        }
    }
    if let Some(id) = parties.supplier_id {
        if supplier::Entity::find_by_id(id).one(conn).await?.is_none() {
            errors.push(FieldError::new("supplier_id", "unknown supplier"));
        }
    }
    if let Some(id) = parties.warehouse_id {
        match warehouse::Entity::find_by_id(id).one(conn).await? {
            None => errors.push(FieldError::new("warehouse_id", "unknown warehouse")),
            Some(w) if w.branch_id != parties.branch_id => errors.push(FieldError::new(
                "warehouse_id",
                "warehouse belongs to another branch",
            )),
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::InvalidFields(errors))
    }
}

pub(crate) async fn ensure_products_exist<C: ConnectionTrait>(
    conn: &C,
    items: &[DocumentItemInput],
) -> Result<(), ServiceError> {
    let wanted: HashSet<Uuid> = items.iter().filter_map(|item| item.product_id).collect();
    let found: HashSet<Uuid> = product::Entity::find()
        .filter(product::Column::Id.is_in(wanted.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let errors: Vec<FieldError> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.product_id.map_or(false, |id| !found.contains(&id)))
        .map(|(index, _)| {
            FieldError::new(format!("items[{}].product_id", index), "unknown product")
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::InvalidFields(errors))
    }
}

/// Totals for the submitted lines. Amounts past the money columns are
/// reported as field errors.
pub(crate) fn compute_totals(
    kind: DocumentKind,
    payload: &DocumentPayload,
    terms: &PricingTerms,
) -> Result<DocumentTotals, ServiceError> {
    totals::compute(kind, &payload.lines(), terms).map_err(|overflow| {
        let field = match overflow {
            AmountOverflow::Line(index) => format!("items[{}]", index),
            AmountOverflow::Total => "items".to_string(),
        };
        ServiceError::InvalidFields(vec![FieldError::new(
            field,
            "amount exceeds the supported range",
        )])
    })
}

/// Inserts the submitted lines at positions `0..n` and returns them as stored.
pub(crate) async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    document_id: Uuid,
    items: &[DocumentItemInput],
    line_totals: &[Decimal],
    now: DateTime<Utc>,
) -> Result<Vec<document_item::Model>, ServiceError> {
    let mut stored = Vec::with_capacity(items.len());

    for (position, (item, line_total)) in items.iter().zip(line_totals).enumerate() {
        let product_id = item.product_id.ok_or_else(|| {
            ServiceError::InvalidFields(vec![FieldError::new(
                format!("items[{}].product_id", position),
                "product is required",
            )])
        })?;
        let model = document_item::Model {
            id: Uuid::new_v4(),
            document_id,
            position: i32::try_from(position)
                .map_err(|_| ServiceError::InvalidInput("too many items".to_string()))?,
            product_id,
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: *line_total,
            created_at: now,
        };
        stored.push(model);
    }

    if !stored.is_empty() {
        let rows = stored.iter().map(|m| document_item::ActiveModel {
            id: Set(m.id),
            document_id: Set(m.document_id),
            position: Set(m.position),
            product_id: Set(m.product_id),
            description: Set(m.description.clone()),
            quantity: Set(m.quantity),
            unit_price: Set(m.unit_price),
            line_total: Set(m.line_total),
            created_at: Set(m.created_at),
        });
        document_item::Entity::insert_many(rows).exec(conn).await?;
    }

    Ok(stored)
}

/// `<PREFIX>-<YYYYMMDD>-<6 hex digits>`, e.g. `INV-20240301-0A1B2C`.
pub fn generate_document_number(kind: DocumentKind, at: DateTime<Utc>) -> String {
    let suffix: u32 = rand::random::<u32>() & 0x00FF_FFFF;
    format!(
        "{}-{}-{:06X}",
        kind.number_prefix(),
        at.format("%Y%m%d"),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn item(quantity: Decimal, unit_price: Decimal) -> DocumentItemInput {
        DocumentItemInput {
            product_id: Some(Uuid::new_v4()),
            description: None,
            quantity,
            unit_price,
        }
    }

    #[test]
    fn empty_item_list_is_rejected_alone() {
        let payload = DocumentPayload {
            exchange_rate: Some(dec!(-1)),
            ..Default::default()
        };
        let err = payload.check().unwrap_err();
        assert_matches!(err, ServiceError::InvalidFields(ref fields) if fields.len() == 1 && fields[0].field == "items");
    }

    #[test]
    fn item_errors_carry_their_index() {
        let mut bad = item(dec!(0), dec!(-5));
        bad.product_id = None;
        let payload = DocumentPayload {
            items: vec![item(dec!(1), dec!(10)), bad],
            ..Default::default()
        };

        let fields = match payload.check() {
            Err(ServiceError::InvalidFields(fields)) => fields,
            other => panic!("unexpected result: {:?}", other),
        };
        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(
            names,
            vec!["items[1].product_id", "items[1].quantity", "items[1].unit_price"]
        );
    }

    #[test]
    fn oversized_amounts_fail_validation() {
        let payload = DocumentPayload {
            items: vec![
                item(dec!(100000000000000000), dec!(1000000000000000)),
                item(dec!(1), dec!(10)),
            ],
            ..Default::default()
        };
        let fields = match payload.check() {
            Err(ServiceError::InvalidFields(fields)) => fields,
            other => panic!("unexpected result: {:?}", other),
        };
        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["items[0].quantity", "items[0].unit_price"]);
    }

    #[test]
    fn totals_past_the_money_columns_are_field_errors() {
        // each line is storable, their product is not
        let payload = DocumentPayload {
            items: vec![item(dec!(1000000), dec!(1000000000))],
            ..Default::default()
        };
        assert!(payload.check().is_ok());

        let err = compute_totals(DocumentKind::Quotation, &payload, &PricingTerms::default())
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidFields(ref fields) if fields[0].field == "items[0]");
    }

    #[test]
    fn header_rates_are_checked() {
        let payload = DocumentPayload {
            exchange_rate: Some(dec!(0)),
            tax_rate: Some(dec!(1.5)),
            items: vec![item(dec!(1), dec!(1))],
            ..Default::default()
        };
        let fields = match payload.check() {
            Err(ServiceError::InvalidFields(fields)) => fields,
            other => panic!("unexpected result: {:?}", other),
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "exchange_rate");
        assert_eq!(fields[1].field, "tax_rate");
    }

    #[test]
    fn imports_need_supplier_and_warehouse() {
        let payload = DocumentPayload {
            items: vec![item(dec!(1), dec!(1))],
            ..Default::default()
        };
        let fields = match payload.check_required_parties(DocumentKind::Import) {
            Err(ServiceError::InvalidFields(fields)) => fields,
            other => panic!("unexpected result: {:?}", other),
        };
        assert_eq!(fields.len(), 2);

        let quotation = DocumentPayload {
            customer_id: Some(Uuid::new_v4()),
            ..payload
        };
        assert!(quotation
            .check_required_parties(DocumentKind::Quotation)
            .is_ok());
    }

    #[test]
    fn document_numbers_follow_the_pattern() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let number = generate_document_number(DocumentKind::DeliveryNote, at);
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts[0], "DN");
        assert_eq!(parts[1], "20240301");
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
