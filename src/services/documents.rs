use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{
    document_lifecycle::{self, DocumentAction},
    fetch_page, Page, PageRequest, SortOrder,
};
use crate::{
    auth::{Actor, BranchAccessPolicy},
    commands::{
        documents::{
            find_document, find_items, CreateDocumentCommand, DeleteDocumentCommand,
            DocumentDefaults, DocumentPayload, DocumentWithItems, ReplaceDocumentItemsCommand,
            TransitionDocumentCommand, TransitionOutcome,
        },
        Command,
    },
    common::DateRangeParams,
    db::{DbPool, SearchBuilder},
    entities::{
        document::{self, DocumentKind, DocumentStatus},
        document_item,
    },
    errors::{FieldError, ServiceError},
    events::EventSender,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSortField {
    #[default]
    CreatedAt,
    Number,
    Total,
    Status,
}

/// Query string accepted by every document list endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DocumentListQuery {
    /// Matches document number and notes
    pub search: Option<String>,
    pub status: Option<DocumentStatus>,
    /// Inclusive lower bound on creation date, `YYYY-MM-DD`
    pub from: Option<String>,
    /// Inclusive upper bound on creation date, `YYYY-MM-DD`
    pub to: Option<String>,
    pub sort_by: Option<DocumentSortField>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// A document, its lines and the actions its current status allows.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: document::Model,
    pub items: Vec<document_item::Model>,
    pub available_actions: Vec<DocumentAction>,
}

impl DocumentView {
    pub fn new(document: document::Model, items: Vec<document_item::Model>) -> Self {
        let available_actions = document_lifecycle::available_actions(document.kind, document.status);
        Self {
            document,
            items,
            available_actions,
        }
    }
}

impl From<DocumentWithItems> for DocumentView {
    fn from(value: DocumentWithItems) -> Self {
        Self::new(value.document, value.items)
    }
}

/// Entry point for every document operation. Each call that touches a
/// single document goes through [`DocumentService::authorize`] first.
#[derive(Clone)]
pub struct DocumentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    policy: BranchAccessPolicy,
    defaults: DocumentDefaults,
}

impl DocumentService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        policy: BranchAccessPolicy,
        defaults: DocumentDefaults,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            policy,
            defaults,
        }
    }

    pub fn policy(&self) -> &BranchAccessPolicy {
        &self.policy
    }

    /// Loads the document and applies the branch policy to it.
    pub async fn authorize(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: Uuid,
    ) -> Result<document::Model, ServiceError> {
        let document = find_document(&*self.db_pool, kind, id).await?;
        self.policy.enforce(actor, document.branch_id)?;
        Ok(document)
    }

    #[instrument(skip(self, actor, query), fields(user_id = %actor.user_id))]
    pub async fn list(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        query: &DocumentListQuery,
        page: PageRequest,
    ) -> Result<Page<document::Model>, ServiceError> {
        let (from, to) = DateRangeParams {
            from: query.from.clone(),
            to: query.to.clone(),
        }
        .to_datetime_range()?;

        let mut select = document::Entity::find().filter(document::Column::Kind.eq(kind));

        if let Some(branch_id) = self.policy.scope(actor) {
            select = select.filter(document::Column::BranchId.eq(branch_id));
        }
        if let Some(search) = query.search.as_deref() {
            if let Some(condition) = SearchBuilder::new()
                .add_like(document::Column::Number, search)
                .add_like(document::Column::Notes, search)
                .build()
            {
                select = select.filter(condition);
            }
        }
        if let Some(status) = query.status {
            select = select.filter(document::Column::Status.eq(status));
        }
        if let Some(from) = from {
            select = select.filter(document::Column::CreatedAt.gte(from));
        }
        if let Some(to) = to {
            select = select.filter(document::Column::CreatedAt.lte(to));
        }

        let column = match query.sort_by.unwrap_or_default() {
            DocumentSortField::CreatedAt => document::Column::CreatedAt,
            DocumentSortField::Number => document::Column::Number,
            DocumentSortField::Total => document::Column::Total,
            DocumentSortField::Status => document::Column::Status,
        };
        select = match query.sort_order.unwrap_or_default() {
            SortOrder::Asc => select.order_by_asc(column),
            SortOrder::Desc => select.order_by_desc(column),
        };
        // stable paging when the sort column has ties
        select = select.order_by_asc(document::Column::Id);

        fetch_page(&self.db_pool, select, page).await
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn get(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: Uuid,
    ) -> Result<DocumentView, ServiceError> {
        let document = self.authorize(actor, kind, id).await?;
        let items = find_items(&*self.db_pool, document.id).await?;
        Ok(DocumentView::new(document, items))
    }

    /// Creates a document in the payload's branch, or the actor's own branch
    /// when none is given.
    #[instrument(skip(self, actor, payload), fields(user_id = %actor.user_id))]
    pub async fn create(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        payload: DocumentPayload,
    ) -> Result<DocumentView, ServiceError> {
        payload.check()?;
        payload.check_required_parties(kind)?;

        let branch_id = payload.branch_id.or(actor.branch_id).ok_or_else(|| {
            ServiceError::InvalidFields(vec![FieldError::new("branch_id", "branch is required")])
        })?;
        self.policy.enforce(actor, branch_id)?;

        let command = CreateDocumentCommand {
            kind,
            branch_id,
            created_by: actor.user_id,
            payload,
            defaults: self.defaults.clone(),
        };
        let created = command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await?;
        Ok(created.into())
    }

    /// Replaces header and items of an editable document.
    #[instrument(skip(self, actor, payload), fields(user_id = %actor.user_id))]
    pub async fn update(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: Uuid,
        payload: DocumentPayload,
    ) -> Result<DocumentView, ServiceError> {
        payload.check()?;

        let document = self.authorize(actor, kind, id).await?;
        document_lifecycle::ensure_editable(kind, document.status)?;
        if matches!(payload.branch_id, Some(branch_id) if branch_id != document.branch_id) {
            return Err(ServiceError::InvalidFields(vec![FieldError::new(
                "branch_id",
                "a document cannot be moved to another branch",
            )]));
        }

        let command = ReplaceDocumentItemsCommand {
            kind,
            document_id: id,
            payload,
        };
        let updated = command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await?;
        Ok(updated.into())
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn delete(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: Uuid,
    ) -> Result<(), ServiceError> {
        let document = self.authorize(actor, kind, id).await?;
        document_lifecycle::ensure_deletable(kind, document.status)?;

        DeleteDocumentCommand {
            kind,
            document_id: id,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn transition(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        id: Uuid,
        action: DocumentAction,
    ) -> Result<TransitionOutcome, ServiceError> {
        let document = self.authorize(actor, kind, id).await?;
        document_lifecycle::transition(kind, document.status, action)?;

        TransitionDocumentCommand {
            kind,
            document_id: id,
            action,
            actor_id: actor.user_id,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }
}
