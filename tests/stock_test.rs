//! Import verification and warehouse transfers.

mod common;

use axum::http::{Method, StatusCode};
use common::{dec, decimal, response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn verifying_an_import_receives_its_items() {
    let app = TestApp::new().await;
    let warehouse = app.seed.jakarta_warehouse.id;
    let product = app.seed.excavator.id;

    let import = app
        .create_import(app.seed.head_office.id, warehouse, 3)
        .await;
    assert_eq!(import["status"], "pending");
    assert_eq!(import["currency"], "USD");
    assert!(import["number"].as_str().unwrap().starts_with("IMP-"));
    assert_eq!(decimal(&import["total"]), dec("3952500000.00"));
    assert_eq!(app.on_hand(warehouse, product).await, dec("0"));

    let id = import["id"].as_str().unwrap();
    let response = app.transition("imports", id, "verify").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["to"], "verified");
    assert_eq!(body["data"]["stock_lines_received"], 1);

    assert_eq!(app.on_hand(warehouse, product).await, dec("3"));

    // verified is terminal; stock is received once
    let response = app.transition("imports", id, "verify").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.on_hand(warehouse, product).await, dec("3"));
}

#[tokio::test]
async fn verified_imports_add_up() {
    let app = TestApp::new().await;
    let warehouse = app.seed.surabaya_warehouse.id;
    let product = app.seed.excavator.id;
    app.seed_stock(warehouse, product, dec("2")).await;

    for quantity in [1, 4] {
        let import = app.create_import(app.seed.surabaya.id, warehouse, quantity).await;
        let response = app
            .transition("imports", import["id"].as_str().unwrap(), "verify")
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.on_hand(warehouse, product).await, dec("7"));
}

#[tokio::test]
async fn cancelled_import_moves_no_stock() {
    let app = TestApp::new().await;
    let warehouse = app.seed.jakarta_warehouse.id;
    let import = app
        .create_import(app.seed.head_office.id, warehouse, 5)
        .await;
    let id = import["id"].as_str().unwrap();

    let response = app.transition("imports", id, "cancel").await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.transition("imports", id, "verify").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.on_hand(warehouse, app.seed.excavator.id).await, dec("0"));
}

#[tokio::test]
async fn branch_user_cannot_verify_head_office_import() {
    let app = TestApp::new().await;
    let import = app
        .create_import(app.seed.head_office.id, app.seed.jakarta_warehouse.id, 1)
        .await;

    let response = app
        .as_branch(
            Method::POST,
            &format!("/api/v1/imports/{}/verify", import["id"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        app.on_hand(app.seed.jakarta_warehouse.id, app.seed.excavator.id)
            .await,
        dec("0")
    );
}

#[tokio::test]
async fn transfer_moves_stock_between_warehouses() {
    let app = TestApp::new().await;
    let from = app.seed.jakarta_warehouse.id;
    let to = app.seed.surabaya_warehouse.id;
    let product = app.seed.crane.id;
    app.seed_stock(from, product, dec("5")).await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/stock/transfers",
            Some(json!({
                "from_warehouse_id": from,
                "to_warehouse_id": to,
                "product_id": product,
                "quantity": "2"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["source"]["quantity"]), dec("3"));
    assert_eq!(decimal(&body["data"]["destination"]["quantity"]), dec("2"));

    assert_eq!(app.on_hand(from, product).await, dec("3"));
    assert_eq!(app.on_hand(to, product).await, dec("2"));
}

#[tokio::test]
async fn transfer_beyond_on_hand_is_unprocessable() {
    let app = TestApp::new().await;
    let from = app.seed.jakarta_warehouse.id;
    let to = app.seed.surabaya_warehouse.id;
    let product = app.seed.crane.id;
    app.seed_stock(from, product, dec("1")).await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/stock/transfers",
            Some(json!({
                "from_warehouse_id": from,
                "to_warehouse_id": to,
                "product_id": product,
                "quantity": 3
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(app.on_hand(from, product).await, dec("1"));
    assert_eq!(app.on_hand(to, product).await, dec("0"));
}

#[tokio::test]
async fn transfer_needs_two_warehouses_and_a_positive_quantity() {
    let app = TestApp::new().await;
    let warehouse = app.seed.jakarta_warehouse.id;

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/stock/transfers",
            Some(json!({
                "from_warehouse_id": warehouse,
                "to_warehouse_id": warehouse,
                "product_id": app.seed.crane.id,
                "quantity": 0
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["errors"].as_array().unwrap().len() >= 1);
}

#[tokio::test]
async fn branch_user_cannot_ship_out_of_head_office() {
    let app = TestApp::new().await;
    let from = app.seed.jakarta_warehouse.id;
    app.seed_stock(from, app.seed.crane.id, dec("4")).await;

    let response = app
        .as_branch(
            Method::POST,
            "/api/v1/stock/transfers",
            Some(json!({
                "from_warehouse_id": from,
                "to_warehouse_id": app.seed.surabaya_warehouse.id,
                "product_id": app.seed.crane.id,
                "quantity": 1
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.on_hand(from, app.seed.crane.id).await, dec("4"));
}
