use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use super::common::{created_response, page_request, paginated};
use crate::{
    auth::Actor,
    commands::inventory::StockTransferResult,
    entities::stock_level,
    errors::ApiError,
    services::inventory::{StockQuery, StockTransferRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

/// List stock levels
#[utoipa::path(
    get,
    path = "/api/v1/stock",
    summary = "List stock levels",
    params(StockQuery),
    responses(
        (status = 200, description = "Stock levels", body = ApiResponse<PaginatedResponse<stock_level::Model>>),
        (status = 403, description = "Warehouse belongs to another branch", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn list_stock(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<StockQuery>,
) -> ApiResult<PaginatedResponse<stock_level::Model>> {
    let page = page_request(&state, query.page, query.limit)?;
    let levels = state
        .services
        .inventory
        .list_stock(&actor, &query, page)
        .await?;
    Ok(Json(ApiResponse::success(paginated(levels))))
}

/// Move stock between warehouses
#[utoipa::path(
    post,
    path = "/api/v1/stock/transfers",
    summary = "Transfer stock",
    request_body = StockTransferRequest,
    responses(
        (status = 201, description = "Transfer booked", body = ApiResponse<StockTransferResult>),
        (status = 400, description = "Invalid transfer", body = crate::errors::ErrorResponse),
        (status = 403, description = "Source warehouse belongs to another branch", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn transfer_stock(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<StockTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.services.inventory.transfer(&actor, request).await?;
    Ok(created_response(result))
}
