use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The four business documents a trading desk produces. They share one table.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentKind {
    #[sea_orm(string_value = "quotation")]
    Quotation,
    #[sea_orm(string_value = "invoice")]
    Invoice,
    #[sea_orm(string_value = "delivery_note")]
    DeliveryNote,
    #[sea_orm(string_value = "import")]
    Import,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Quotation,
        DocumentKind::Invoice,
        DocumentKind::DeliveryNote,
        DocumentKind::Import,
    ];

    /// Prefix of generated document numbers.
    pub fn number_prefix(self) -> &'static str {
        match self {
            DocumentKind::Quotation => "QT",
            DocumentKind::Invoice => "INV",
            DocumentKind::DeliveryNote => "DN",
            DocumentKind::Import => "IMP",
        }
    }

    /// Resource segment used in permission strings (`quotations:read`).
    pub fn permission_resource(self) -> &'static str {
        match self {
            DocumentKind::Quotation => "quotations",
            DocumentKind::Invoice => "invoices",
            DocumentKind::DeliveryNote => "delivery_notes",
            DocumentKind::Import => "imports",
        }
    }

    /// URL segment under `/api/v1`.
    pub fn route_segment(self) -> &'static str {
        match self {
            DocumentKind::Quotation => "quotations",
            DocumentKind::Invoice => "invoices",
            DocumentKind::DeliveryNote => "delivery-notes",
            DocumentKind::Import => "imports",
        }
    }

    pub fn permission(self, action: &str) -> String {
        format!("{}:{}", self.permission_resource(), action)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "revised")]
    Revised,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "documents")]
#[schema(as = Document)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: DocumentKind,
    #[sea_orm(unique)]
    pub number: String,
    pub status: DocumentStatus,
    pub branch_id: Uuid,
    pub created_by: Uuid,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((18, 6)))")]
    pub exchange_rate: Decimal,
    pub apply_tax: bool,
    #[sea_orm(column_type = "Decimal(Some((8, 4)))")]
    pub tax_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document_item::Entity")]
    Items,
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
}

impl Related<super::document_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_names_round_trip_through_strum() {
        for kind in DocumentKind::ALL {
            assert_eq!(DocumentKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert_eq!(DocumentKind::DeliveryNote.to_string(), "delivery_note");
    }

    #[test]
    fn permission_strings_use_resource_names() {
        assert_eq!(
            DocumentKind::DeliveryNote.permission("send"),
            "delivery_notes:send"
        );
        assert_eq!(DocumentKind::Import.route_segment(), "imports");
    }
}
