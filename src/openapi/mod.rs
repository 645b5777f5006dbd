use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tradedesk API",
        version = "0.3.0",
        description = r#"
Document workflow for an equipment trading desk.

Quotations, invoices, delivery notes and imports share one lifecycle engine.
Every document carries a branch; users attached to a branch other than head
office only see and change their own branch's documents and warehouses.
Verifying an import books its items into warehouse stock.

All `/api/v1` endpoints take a bearer token:

```
Authorization: Bearer <jwt>
```
"#
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    modifiers(&BearerAuth),
    tags(
        (name = "Documents", description = "Quotations, invoices, delivery notes and imports"),
        (name = "Inventory", description = "Stock levels and transfers"),
        (name = "Reference", description = "Branches, warehouses, products, customers, suppliers"),
        (name = "Dashboard", description = "Kanban board counts"),
        (name = "Health", description = "Status and health checks")
    ),
    paths(
        crate::handlers::documents::list_documents,
        crate::handlers::documents::get_document,
        crate::handlers::documents::create_document,
        crate::handlers::documents::update_document,
        crate::handlers::documents::delete_document,
        crate::handlers::documents::transition_document,
        crate::handlers::inventory::list_stock,
        crate::handlers::inventory::transfer_stock,
        crate::handlers::reference::list_branches,
        crate::handlers::reference::create_branch,
        crate::handlers::reference::list_warehouses,
        crate::handlers::reference::create_warehouse,
        crate::handlers::reference::list_products,
        crate::handlers::reference::create_product,
        crate::handlers::reference::list_customers,
        crate::handlers::reference::create_customer,
        crate::handlers::reference::list_suppliers,
        crate::handlers::reference::create_supplier,
        crate::handlers::dashboard::board,
        crate::handlers::health::api_status,
        crate::handlers::health::health_check,
    ),
    components(schemas(crate::errors::ErrorResponse, crate::errors::FieldError))
)]
pub struct ApiDocV1;

/// `GET /api-docs/openapi.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_routes_and_bearer_scheme_are_published() {
        let json = serde_json::to_string(&ApiDocV1::openapi()).unwrap();
        assert!(json.contains("Tradedesk API"));
        assert!(json.contains("/api/v1/{resource}/{id}/{action}"));
        assert!(json.contains("/api/v1/stock/transfers"));
        assert!(json.contains("\"Bearer\""));
    }
}
