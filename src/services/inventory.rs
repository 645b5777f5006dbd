use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{fetch_page, Page, PageRequest};
use crate::{
    auth::{Actor, BranchAccessPolicy},
    commands::{
        inventory::{StockTransferResult, TransferStockCommand},
        Command,
    },
    db::DbPool,
    entities::{stock_level, warehouse},
    errors::ServiceError,
    events::EventSender,
};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    pub warehouse_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockTransferRequest {
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub product_id: Uuid,
    #[serde(default, deserialize_with = "crate::common::deserialize_money")]
    pub quantity: Decimal,
}

/// Stock levels and transfers, scoped by the branch that owns each warehouse.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    policy: BranchAccessPolicy,
}

impl InventoryService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        policy: BranchAccessPolicy,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            policy,
        }
    }

    /// Loads a warehouse and applies the branch policy to its branch.
    pub async fn authorize_warehouse(
        &self,
        actor: &Actor,
        warehouse_id: Uuid,
    ) -> Result<warehouse::Model, ServiceError> {
        let warehouse = warehouse::Entity::find_by_id(warehouse_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("warehouse {} not found", warehouse_id)))?;
        self.policy.enforce(actor, warehouse.branch_id)?;
        Ok(warehouse)
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn list_stock(
        &self,
        actor: &Actor,
        query: &StockQuery,
        page: PageRequest,
    ) -> Result<Page<stock_level::Model>, ServiceError> {
        let mut select = stock_level::Entity::find();

        if let Some(warehouse_id) = query.warehouse_id {
            self.authorize_warehouse(actor, warehouse_id).await?;
            select = select.filter(stock_level::Column::WarehouseId.eq(warehouse_id));
        } else if let Some(branch_id) = self.policy.scope(actor) {
            select = select
                .join(JoinType::InnerJoin, stock_level::Relation::Warehouse.def())
                .filter(warehouse::Column::BranchId.eq(branch_id));
        }
        if let Some(product_id) = query.product_id {
            select = select.filter(stock_level::Column::ProductId.eq(product_id));
        }

        let select = select
            .order_by_asc(stock_level::Column::WarehouseId)
            .order_by_asc(stock_level::Column::ProductId);
        fetch_page(&self.db_pool, select, page).await
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn transfer(
        &self,
        actor: &Actor,
        request: StockTransferRequest,
    ) -> Result<StockTransferResult, ServiceError> {
        let command = TransferStockCommand {
            from_warehouse_id: request.from_warehouse_id,
            to_warehouse_id: request.to_warehouse_id,
            product_id: request.product_id,
            quantity: request.quantity,
        };
        command.check()?;
        self.authorize_warehouse(actor, command.from_warehouse_id)
            .await?;

        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }
}
