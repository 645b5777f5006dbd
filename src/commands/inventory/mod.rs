//! Stock-moving commands and the ledger helper they share.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QuerySelect,
};
use uuid::Uuid;

use crate::entities::{
    stock_level,
    stock_movement::{self, MovementType},
};
use crate::errors::ServiceError;

mod transfer_stock;

pub use transfer_stock::{StockTransferResult, TransferStockCommand};

/// One ledger entry to apply: signed `delta` of `product_id` in `warehouse_id`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StockDelta {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub delta: Decimal,
    pub movement_type: MovementType,
    pub reference_id: Uuid,
}

/// Applies a delta to the stock level row (creating it for positive deltas)
/// and appends the matching movement. A level may never drop below zero.
pub(crate) async fn apply_stock_delta<C: ConnectionTrait>(
    conn: &C,
    change: StockDelta,
    now: DateTime<Utc>,
) -> Result<stock_level::Model, ServiceError> {
    let current = stock_level::Entity::find()
        .filter(stock_level::Column::WarehouseId.eq(change.warehouse_id))
        .filter(stock_level::Column::ProductId.eq(change.product_id))
        .lock_exclusive()
        .one(conn)
        .await?;

    let on_hand = current
        .as_ref()
        .map(|level| level.quantity)
        .unwrap_or(Decimal::ZERO);
    let updated_quantity = on_hand + change.delta;
    if updated_quantity < Decimal::ZERO {
        return Err(ServiceError::InsufficientStock(format!(
            "product {} has {} on hand in warehouse {}, {} requested",
            change.product_id,
            on_hand.normalize(),
            change.warehouse_id,
            (-change.delta).normalize()
        )));
    }

    let level = match current {
        Some(level) => {
            let mut active = level.into_active_model();
            active.quantity = Set(updated_quantity);
            active.updated_at = Set(now);
            active.update(conn).await?
        }
        None => {
            stock_level::ActiveModel {
                id: Set(Uuid::new_v4()),
                warehouse_id: Set(change.warehouse_id),
                product_id: Set(change.product_id),
                quantity: Set(updated_quantity),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?
        }
    };

    stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        warehouse_id: Set(change.warehouse_id),
        product_id: Set(change.product_id),
        quantity: Set(change.delta),
        movement_type: Set(change.movement_type),
        reference_id: Set(change.reference_id),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    Ok(level)
}
