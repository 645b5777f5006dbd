use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{apply_stock_delta, StockDelta};
use crate::{
    commands::Command,
    db::{with_transaction, DbPool},
    entities::{product, stock_level, stock_movement::MovementType, warehouse},
    errors::{FieldError, ServiceError},
    events::{Event, EventSender},
    metrics,
};

/// Moves a quantity of one product between two warehouses. Authorization
/// against the source warehouse happens before the command runs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferStockCommand {
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockTransferResult {
    pub transfer_id: Uuid,
    pub source: stock_level::Model,
    pub destination: stock_level::Model,
}

#[async_trait]
impl Command for TransferStockCommand {
    type Result = StockTransferResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.check()?;

        let command = self.clone();
        let result = with_transaction(&db_pool, move |txn| {
            Box::pin(async move { command.transfer(txn).await })
        })
        .await
        .map_err(|e| {
            error!(
                from = %self.from_warehouse_id,
                to = %self.to_warehouse_id,
                product_id = %self.product_id,
                error = %e,
                "Stock transfer failed"
            );
            metrics::record_failure("transfer_stock", &e);
            e
        })?;

        event_sender
            .send_or_log(Event::StockTransferred {
                transfer_id: result.transfer_id,
                from_warehouse_id: self.from_warehouse_id,
                to_warehouse_id: self.to_warehouse_id,
                product_id: self.product_id,
                quantity: self.quantity,
            })
            .await;

        metrics::STOCK_TRANSFERS.inc();
        info!(
            transfer_id = %result.transfer_id,
            quantity = %self.quantity,
            "Stock transferred"
        );

        Ok(result)
    }
}

impl TransferStockCommand {
    pub fn check(&self) -> Result<(), ServiceError> {
        let mut errors = Vec::new();
        if self.quantity <= Decimal::ZERO {
            errors.push(FieldError::new(
                "quantity",
                "quantity must be greater than zero",
            ));
        }
        if self.from_warehouse_id == self.to_warehouse_id {
            errors.push(FieldError::new(
                "to_warehouse_id",
                "source and destination warehouses must differ",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidFields(errors))
        }
    }

    async fn transfer(&self, txn: &DatabaseTransaction) -> Result<StockTransferResult, ServiceError> {
        for id in [self.from_warehouse_id, self.to_warehouse_id] {
            if warehouse::Entity::find_by_id(id).one(txn).await?.is_none() {
                return Err(ServiceError::NotFound(format!("warehouse {} not found", id)));
            }
        }
        if product::Entity::find_by_id(self.product_id)
            .one(txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "product {} not found",
                self.product_id
            )));
        }

        let transfer_id = Uuid::new_v4();
        let now = Utc::now();

        let source = apply_stock_delta(
            txn,
            StockDelta {
                warehouse_id: self.from_warehouse_id,
                product_id: self.product_id,
                delta: -self.quantity,
                movement_type: MovementType::TransferOut,
                reference_id: transfer_id,
            },
            now,
        )
        .await?;
        let destination = apply_stock_delta(
            txn,
            StockDelta {
                warehouse_id: self.to_warehouse_id,
                product_id: self.product_id,
                delta: self.quantity,
                movement_type: MovementType::TransferIn,
                reference_id: transfer_id,
            },
            now,
        )
        .await?;

        Ok(StockTransferResult {
            transfer_id,
            source,
            destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn same_warehouse_and_zero_quantity_are_rejected() {
        let warehouse = Uuid::new_v4();
        let command = TransferStockCommand {
            from_warehouse_id: warehouse,
            to_warehouse_id: warehouse,
            product_id: Uuid::new_v4(),
            quantity: dec!(0),
        };
        assert_matches!(command.check(), Err(ServiceError::InvalidFields(fields)) if fields.len() == 2);
    }
}
