use axum::{extract::State, Json};

use crate::{
    auth::Actor,
    services::dashboard::DashboardBoard,
    ApiResponse, ApiResult, AppState,
};

/// Kanban counts by document kind and status
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/board",
    summary = "Dashboard board",
    responses((status = 200, description = "Counts per kind and status", body = ApiResponse<DashboardBoard>)),
    security(("Bearer" = []))
)]
pub async fn board(State(state): State<AppState>, actor: Actor) -> ApiResult<DashboardBoard> {
    let board = state.services.dashboard.board(&actor).await?;
    Ok(Json(ApiResponse::success(board)))
}
