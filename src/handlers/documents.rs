//! Handlers shared by the four document resources. The router mounts them
//! once per [`DocumentKind`] and hands the kind in as a request extension.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use std::str::FromStr;
use uuid::Uuid;

use super::common::{created_response, no_content_response, page_request, paginated};
use crate::{
    auth::{Actor, AuthUser},
    commands::documents::{DocumentPayload, TransitionOutcome},
    entities::document::{self, DocumentKind},
    errors::{ApiError, ServiceError},
    services::{
        document_lifecycle::DocumentAction,
        documents::{DocumentListQuery, DocumentView},
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

/// List documents of one kind
#[utoipa::path(
    get,
    path = "/api/v1/{resource}",
    summary = "List documents",
    description = "Paginated list of quotations, invoices, delivery notes or imports. Branch-scoped users only see their branch.",
    params(
        ("resource" = String, Path, description = "quotations | invoices | delivery-notes | imports"),
        DocumentListQuery
    ),
    responses(
        (status = 200, description = "Documents retrieved", body = ApiResponse<PaginatedResponse<document::Model>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    actor: Actor,
    Query(query): Query<DocumentListQuery>,
) -> ApiResult<PaginatedResponse<document::Model>> {
    let page = page_request(&state, query.page, query.limit)?;
    let result = state
        .services
        .documents
        .list(&actor, kind, &query, page)
        .await?;
    Ok(Json(ApiResponse::success(paginated(result))))
}

/// Get one document with its items
#[utoipa::path(
    get,
    path = "/api/v1/{resource}/{id}",
    summary = "Get document",
    params(
        ("resource" = String, Path, description = "quotations | invoices | delivery-notes | imports"),
        ("id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Document retrieved", body = ApiResponse<DocumentView>),
        (status = 403, description = "Document belongs to another branch", body = crate::errors::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> ApiResult<DocumentView> {
    let view = state.services.documents.get(&actor, kind, id).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// Create a document
#[utoipa::path(
    post,
    path = "/api/v1/{resource}",
    summary = "Create document",
    request_body = DocumentPayload,
    params(("resource" = String, Path, description = "quotations | invoices | delivery-notes | imports")),
    responses(
        (status = 201, description = "Document created", body = ApiResponse<DocumentView>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 403, description = "Branch not accessible", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    actor: Actor,
    Json(payload): Json<DocumentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .documents
        .create(&actor, kind, payload)
        .await?;
    Ok(created_response(view))
}

/// Replace header and the full item list
#[utoipa::path(
    put,
    path = "/api/v1/{resource}/{id}",
    summary = "Update document",
    description = "Replaces the header fields given and the complete item list in one transaction.",
    request_body = DocumentPayload,
    params(
        ("resource" = String, Path, description = "quotations | invoices | delivery-notes | imports"),
        ("id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Document updated", body = ApiResponse<DocumentView>),
        (status = 400, description = "Invalid items or status not editable", body = crate::errors::ErrorResponse),
        (status = 403, description = "Document belongs to another branch", body = crate::errors::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn update_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<DocumentPayload>,
) -> ApiResult<DocumentView> {
    let view = state
        .services
        .documents
        .update(&actor, kind, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(view)))
}

/// Delete a document
#[utoipa::path(
    delete,
    path = "/api/v1/{resource}/{id}",
    summary = "Delete document",
    params(
        ("resource" = String, Path, description = "quotations | invoices | delivery-notes | imports"),
        ("id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 400, description = "Status does not allow deletion", body = crate::errors::ErrorResponse),
        (status = 403, description = "Document belongs to another branch", body = crate::errors::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.documents.delete(&actor, kind, id).await?;
    Ok(no_content_response())
}

/// Apply a lifecycle action (`submit`, `approve`, `verify`, ...)
#[utoipa::path(
    post,
    path = "/api/v1/{resource}/{id}/{action}",
    summary = "Transition document",
    description = "Requires the `<resource>:<action>` permission. Verifying an import books its items into stock.",
    params(
        ("resource" = String, Path, description = "quotations | invoices | delivery-notes | imports"),
        ("id" = Uuid, Path, description = "Document id"),
        ("action" = DocumentAction, Path, description = "Lifecycle action")
    ),
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<TransitionOutcome>),
        (status = 400, description = "Transition not allowed from the current status", body = crate::errors::ErrorResponse),
        (status = 403, description = "Missing permission or other branch", body = crate::errors::ErrorResponse),
        (status = 404, description = "Document or action not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn transition_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    Extension(auth): Extension<AuthUser>,
    actor: Actor,
    Path((id, action)): Path<(Uuid, String)>,
) -> ApiResult<TransitionOutcome> {
    let action = DocumentAction::from_str(&action)
        .map_err(|_| ApiError::NotFound(format!("unknown action '{}'", action)))?;

    let permission = kind.permission(&action.to_string());
    auth.require_permission(&permission)
        .map_err(|_| ServiceError::Forbidden(format!("missing permission {}", permission)))?;

    let outcome = state
        .services
        .documents
        .transition(&actor, kind, id, action)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}
