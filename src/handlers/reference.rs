use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use super::common::{created_response, page_request, paginated};
use crate::{
    auth::Actor,
    entities::{branch, customer, product, supplier, warehouse},
    errors::ApiError,
    services::reference::{
        CreateBranchRequest, CreateCustomerRequest, CreateProductRequest, CreateSupplierRequest,
        CreateWarehouseRequest, ReferenceListQuery,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/branches",
    params(ReferenceListQuery),
    responses((status = 200, description = "Branches", body = ApiResponse<PaginatedResponse<branch::Model>>)),
    security(("Bearer" = []))
)]
pub async fn list_branches(
    State(state): State<AppState>,
    Query(query): Query<ReferenceListQuery>,
) -> ApiResult<PaginatedResponse<branch::Model>> {
    let page = page_request(&state, query.page, query.limit)?;
    let result = state.services.reference.list_branches(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(result))))
}

#[utoipa::path(
    post,
    path = "/api/v1/branches",
    request_body = CreateBranchRequest,
    responses(
        (status = 201, description = "Branch created", body = ApiResponse<branch::Model>),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_branch(
    State(state): State<AppState>,
    Json(request): Json<CreateBranchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.services.reference.create_branch(request).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/v1/warehouses",
    params(ReferenceListQuery),
    responses((status = 200, description = "Warehouses visible to the caller", body = ApiResponse<PaginatedResponse<warehouse::Model>>)),
    security(("Bearer" = []))
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<ReferenceListQuery>,
) -> ApiResult<PaginatedResponse<warehouse::Model>> {
    let page = page_request(&state, query.page, query.limit)?;
    let result = state
        .services
        .reference
        .list_warehouses(&actor, &query, page)
        .await?;
    Ok(Json(ApiResponse::success(paginated(result))))
}

#[utoipa::path(
    post,
    path = "/api/v1/warehouses",
    request_body = CreateWarehouseRequest,
    responses(
        (status = 201, description = "Warehouse created", body = ApiResponse<warehouse::Model>),
        (status = 403, description = "Branch not accessible", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateWarehouseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .reference
        .create_warehouse(&actor, request)
        .await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ReferenceListQuery),
    responses((status = 200, description = "Products", body = ApiResponse<PaginatedResponse<product::Model>>)),
    security(("Bearer" = []))
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ReferenceListQuery>,
) -> ApiResult<PaginatedResponse<product::Model>> {
    let page = page_request(&state, query.page, query.limit)?;
    let result = state.services.reference.list_products(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(result))))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<product::Model>),
        (status = 409, description = "SKU already taken", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.services.reference.create_product(request).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(ReferenceListQuery),
    responses((status = 200, description = "Customers", body = ApiResponse<PaginatedResponse<customer::Model>>)),
    security(("Bearer" = []))
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ReferenceListQuery>,
) -> ApiResult<PaginatedResponse<customer::Model>> {
    let page = page_request(&state, query.page, query.limit)?;
    let result = state.services.reference.list_customers(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(result))))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses((status = 201, description = "Customer created", body = ApiResponse<customer::Model>)),
    security(("Bearer" = []))
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.services.reference.create_customer(request).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    params(ReferenceListQuery),
    responses((status = 200, description = "Suppliers", body = ApiResponse<PaginatedResponse<supplier::Model>>)),
    security(("Bearer" = []))
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<ReferenceListQuery>,
) -> ApiResult<PaginatedResponse<supplier::Model>> {
    let page = page_request(&state, query.page, query.limit)?;
    let result = state.services.reference.list_suppliers(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(result))))
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreateSupplierRequest,
    responses((status = 201, description = "Supplier created", body = ApiResponse<supplier::Model>)),
    security(("Bearer" = []))
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.services.reference.create_supplier(request).await?;
    Ok(created_response(created))
}
