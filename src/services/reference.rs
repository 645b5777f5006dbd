//! Reference data: branches, warehouses, products, customers and suppliers.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{fetch_page, Page, PageRequest};
use crate::{
    auth::{Actor, BranchAccessPolicy},
    common::deserialize_money,
    db::{DbPool, SearchBuilder},
    entities::{branch, customer, product, supplier, warehouse},
    errors::{FieldError, ServiceError},
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReferenceListQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateWarehouseRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    pub branch_id: Uuid,
    #[validate(length(max = 255))]
    pub location: Option<String>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price >= Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("unit price cannot be negative".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64, message = "sku must be 1-64 characters"))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_money")]
    #[validate(custom = "validate_price")]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 64))]
    pub country: Option<String>,
    #[validate(email(message = "email is not valid"))]
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct ReferenceDataService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    policy: BranchAccessPolicy,
}

impl ReferenceDataService {
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

    async fn announce(&self, entity: &str, id: Uuid) {
        info!(entity, %id, "Reference record created");
        self.event_sender
            .send_or_log(Event::ReferenceRecordCreated {
                entity: entity.to_string(),
                id,
            })
            .await;
    }

    #[instrument(skip(self))]
    pub async fn list_branches(
        &self,
        query: &ReferenceListQuery,
        page: PageRequest,
    ) -> Result<Page<branch::Model>, ServiceError> {
        let mut select = branch::Entity::find().order_by_asc(branch::Column::Name);
        if let Some(condition) = query
            .search
            .as_deref()
            .and_then(|s| SearchBuilder::new().add_like(branch::Column::Name, s).build())
        {
            select = select.filter(condition);
        }
        fetch_page(&self.db_pool, select, page).await
    }

    #[instrument(skip(self))]
    pub async fn create_branch(
        &self,
        request: CreateBranchRequest,
    ) -> Result<branch::Model, ServiceError> {
        request.validate()?;
        let name = request.name.trim().to_string();

        if branch::Entity::find()
            .filter(branch::Column::Name.eq(name.as_str()))
            .one(&*self.db_pool)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!("branch '{}' already exists", name)));
        }

        let created = branch::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        self.announce("branch", created.id).await;
        Ok(created)
    }

    /// Branch-scoped actors only see their own branch's warehouses.
    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn list_warehouses(
        &self,
        actor: &Actor,
        query: &ReferenceListQuery,
        page: PageRequest,
    ) -> Result<Page<warehouse::Model>, ServiceError> {
        let mut select = warehouse::Entity::find().order_by_asc(warehouse::Column::Name);
        if let Some(branch_id) = self.policy.scope(actor) {
            select = select.filter(warehouse::Column::BranchId.eq(branch_id));
        }
        if let Some(condition) = query.search.as_deref().and_then(|s| {
            SearchBuilder::new()
                .add_like(warehouse::Column::Name, s)
                .add_like(warehouse::Column::Location, s)
                .build()
        }) {
            select = select.filter(condition);
        }
        fetch_page(&self.db_pool, select, page).await
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn create_warehouse(
        &self,
        actor: &Actor,
        request: CreateWarehouseRequest,
    ) -> Result<warehouse::Model, ServiceError> {
        request.validate()?;
        if branch::Entity::find_by_id(request.branch_id)
            .one(&*self.db_pool)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidFields(vec![FieldError::new(
                "branch_id",
                "unknown branch",
            )]));
        }
        self.policy.enforce(actor, request.branch_id)?;

        let created = warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            branch_id: Set(request.branch_id),
            location: Set(request.location),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        self.announce("warehouse", created.id).await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: &ReferenceListQuery,
        page: PageRequest,
    ) -> Result<Page<product::Model>, ServiceError> {
        let mut select = product::Entity::find().order_by_asc(product::Column::Sku);
        if let Some(condition) = query.search.as_deref().and_then(|s| {
            SearchBuilder::new()
                .add_like(product::Column::Sku, s)
                .add_like(product::Column::Name, s)
                .build()
        }) {
            select = select.filter(condition);
        }
        fetch_page(&self.db_pool, select, page).await
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        let sku = request.sku.trim().to_uppercase();

        if product::Entity::find()
            .filter(product::Column::Sku.eq(sku.as_str()))
            .one(&*self.db_pool)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!("product '{}' already exists", sku)));
        }

        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(sku),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            unit_price: Set(request.unit_price),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        self.announce("product", created.id).await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        query: &ReferenceListQuery,
        page: PageRequest,
    ) -> Result<Page<customer::Model>, ServiceError> {
        let mut select = customer::Entity::find().order_by_asc(customer::Column::Name);
        if let Some(condition) = query.search.as_deref().and_then(|s| {
            SearchBuilder::new()
                .add_like(customer::Column::Name, s)
                .add_like(customer::Column::Email, s)
                .build()
        }) {
            select = select.filter(condition);
        }
        fetch_page(&self.db_pool, select, page).await
    }

    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let created = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            email: Set(request.email),
            phone: Set(request.phone),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        self.announce("customer", created.id).await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        query: &ReferenceListQuery,
        page: PageRequest,
    ) -> Result<Page<supplier::Model>, ServiceError> {
        let mut select = supplier::Entity::find().order_by_asc(supplier::Column::Name);
        if let Some(condition) = query.search.as_deref().and_then(|s| {
            SearchBuilder::new()
                .add_like(supplier::Column::Name, s)
                .add_like(supplier::Column::Country, s)
                .build()
        }) {
            select = select.filter(condition);
        }
        fetch_page(&self.db_pool, select, page).await
    }

    #[instrument(skip(self))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;
        let created = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            country: Set(request.country),
            email: Set(request.email),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        self.announce("supplier", created.id).await;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_customer_email_is_reported_by_field() {
        let request = CreateCustomerRequest {
            name: "PT Maju Jaya".into(),
            email: Some("not-an-email".into()),
            phone: None,
        };
        let err: ServiceError = request.validate().unwrap_err().into();
        assert_eq!(
            err.field_errors().unwrap(),
            vec![FieldError::new("email", "email is not valid")]
        );
    }

    #[test]
    fn negative_product_price_is_rejected() {
        let request = CreateProductRequest {
            sku: "EXC-200".into(),
            name: "Excavator 20t".into(),
            description: None,
            unit_price: Decimal::NEGATIVE_ONE,
        };
        assert!(request.validate().is_err());
    }
}
