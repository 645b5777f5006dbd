use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::{
    errors::ServiceError,
    services::{Page, PageRequest},
    ApiResponse, AppState, PaginatedResponse,
};

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Standard no content response
pub fn no_content_response() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Builds a page request, clamping `limit` to the configured bounds.
pub fn page_request(
    state: &AppState,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<PageRequest, ServiceError> {
    PageRequest::new(page, state.config.clamp_page_size(limit))
}

pub fn paginated<T>(page: Page<T>) -> PaginatedResponse<T> {
    let total_pages = page.total_pages();
    PaginatedResponse {
        items: page.items,
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_carries_page_math() {
        let response = paginated(Page {
            items: vec![1, 2],
            total: 42,
            page: 3,
            limit: 20,
        });
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.items, vec![1, 2]);
        assert_eq!(response.page, 3);
    }
}
