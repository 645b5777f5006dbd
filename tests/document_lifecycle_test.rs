//! End-to-end lifecycle tests for quotations, invoices and delivery notes.

mod common;

use axum::http::{Method, StatusCode};
use common::{dec, decimal, response_json, TestApp};
use serde_json::{json, Value};

fn actions(document: &Value) -> Vec<String> {
    document["available_actions"]
        .as_array()
        .expect("available_actions array")
        .iter()
        .map(|a| a.as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn quotation_walks_from_draft_to_accepted() {
    let app = TestApp::new().await;
    let created = app.create_quotation(app.seed.head_office.id).await;

    assert_eq!(created["status"], "draft");
    assert_eq!(created["currency"], "IDR");
    assert!(created["number"].as_str().unwrap().starts_with("QT-"));
    assert_eq!(created["items"].as_array().unwrap().len(), 2);
    assert_eq!(decimal(&created["subtotal"]), dec("3480001.00"));
    assert_eq!(decimal(&created["tax_amount"]), dec("382800.11"));
    assert_eq!(decimal(&created["total"]), dec("3862801.11"));
    assert_eq!(actions(&created), vec!["submit", "cancel"]);

    let id = created["id"].as_str().unwrap().to_string();
    for (action, expected) in [
        ("submit", "submitted"),
        ("approve", "approved"),
        ("send", "sent"),
        ("accept", "accepted"),
    ] {
        let response = app.transition("quotations", &id, action).await;
        assert_eq!(response.status(), StatusCode::OK, "{} should succeed", action);
        let body = response_json(response).await;
        assert_eq!(body["data"]["to"], expected);
        assert_eq!(body["data"]["document"]["status"], expected);
    }

    let response = app
        .as_admin(Method::GET, &format!("/api/v1/quotations/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "accepted");
    assert!(actions(&body["data"]).is_empty());
}

#[tokio::test]
async fn sending_an_unapproved_quotation_is_rejected() {
    let app = TestApp::new().await;
    let created = app.create_quotation(app.seed.head_office.id).await;
    let id = created["id"].as_str().unwrap();

    let response = app.transition("quotations", id, "send").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .as_admin(Method::GET, &format!("/api/v1/quotations/{}", id), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "draft");
}

#[tokio::test]
async fn rejected_quotation_can_be_revised_and_resubmitted() {
    let app = TestApp::new().await;
    let created = app.create_quotation(app.seed.head_office.id).await;
    let id = created["id"].as_str().unwrap();

    for action in ["submit", "reject", "revise"] {
        let response = app.transition("quotations", id, action).await;
        assert_eq!(response.status(), StatusCode::OK, "{} should succeed", action);
    }

    // revised documents are editable again
    let mut payload = app.quotation_payload(app.seed.head_office.id);
    payload["items"] = json!([
        { "product_id": app.seed.crane.id, "quantity": 1, "unit_price": "950000" }
    ]);
    let response = app
        .as_admin(Method::PUT, &format!("/api/v1/quotations/{}", id), Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.transition("quotations", id, "submit").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["from"], "revised");
    assert_eq!(body["data"]["to"], "submitted");
}

#[tokio::test]
async fn unknown_action_is_not_found() {
    let app = TestApp::new().await;
    let created = app.create_quotation(app.seed.head_office.id).await;
    let id = created["id"].as_str().unwrap();

    let response = app.transition("quotations", id, "teleport").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn action_of_another_kind_is_rejected() {
    let app = TestApp::new().await;
    let created = app.create_quotation(app.seed.head_office.id).await;
    let id = created["id"].as_str().unwrap();

    // `pay` exists, but only for invoices
    let response = app.transition("quotations", id, "pay").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submitted_quotation_is_no_longer_editable() {
    let app = TestApp::new().await;
    let created = app.create_quotation(app.seed.head_office.id).await;
    let id = created["id"].as_str().unwrap();
    app.transition("quotations", id, "submit").await;

    let response = app
        .as_admin(
            Method::PUT,
            &format!("/api/v1/quotations/{}", id),
            Some(app.quotation_payload(app.seed.head_office.id)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invoice_is_paid_after_sending() {
    let app = TestApp::new().await;
    let mut payload = app.quotation_payload(app.seed.head_office.id);
    payload["apply_tax"] = json!(false);

    let response = app
        .as_admin(Method::POST, "/api/v1/invoices", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await["data"].clone();
    assert!(created["number"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(decimal(&created["tax_amount"]), dec("0"));
    assert_eq!(decimal(&created["total"]), dec("3480001.00"));

    let id = created["id"].as_str().unwrap();
    for action in ["submit", "approve", "send", "pay"] {
        let response = app.transition("invoices", id, action).await;
        assert_eq!(response.status(), StatusCode::OK, "{} should succeed", action);
    }

    // paid is terminal
    let response = app.transition("invoices", id, "cancel").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delivery_note_requires_a_warehouse_and_is_untaxed() {
    let app = TestApp::new().await;

    let mut payload = app.quotation_payload(app.seed.head_office.id);
    let response = app
        .as_admin(Method::POST, "/api/v1/delivery-notes", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["errors"][0]["field"], "warehouse_id");

    payload["warehouse_id"] = json!(app.seed.jakarta_warehouse.id);
    let response = app
        .as_admin(Method::POST, "/api/v1/delivery-notes", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await["data"].clone();
    assert!(created["number"].as_str().unwrap().starts_with("DN-"));
    assert_eq!(decimal(&created["tax_amount"]), dec("0"));

    let id = created["id"].as_str().unwrap();
    for action in ["send", "deliver"] {
        let response = app.transition("delivery-notes", id, action).await;
        assert_eq!(response.status(), StatusCode::OK, "{} should succeed", action);
    }
}

#[tokio::test]
async fn warehouse_of_another_branch_is_rejected() {
    let app = TestApp::new().await;
    let mut payload = app.quotation_payload(app.seed.head_office.id);
    payload["warehouse_id"] = json!(app.seed.surabaya_warehouse.id);

    let response = app
        .as_admin(Method::POST, "/api/v1/delivery-notes", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["errors"][0]["field"], "warehouse_id");
}

#[tokio::test]
async fn draft_can_be_deleted_but_sent_cannot() {
    let app = TestApp::new().await;

    let draft = app.create_quotation(app.seed.head_office.id).await;
    let draft_id = draft["id"].as_str().unwrap();
    let response = app
        .as_admin(Method::DELETE, &format!("/api/v1/quotations/{}", draft_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app
        .as_admin(Method::GET, &format!("/api/v1/quotations/{}", draft_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let sent = app.create_quotation(app.seed.head_office.id).await;
    let sent_id = sent["id"].as_str().unwrap();
    for action in ["submit", "approve", "send"] {
        app.transition("quotations", sent_id, action).await;
    }
    let response = app
        .as_admin(Method::DELETE, &format!("/api/v1/quotations/{}", sent_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn document_is_only_found_under_its_own_kind() {
    let app = TestApp::new().await;
    let created = app.create_quotation(app.seed.head_office.id).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .as_admin(Method::GET, &format!("/api/v1/invoices/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_status_and_paginates() {
    let app = TestApp::new().await;
    for _ in 0..3 {
        app.create_quotation(app.seed.head_office.id).await;
    }
    let submitted = app.create_quotation(app.seed.head_office.id).await;
    app.transition("quotations", submitted["id"].as_str().unwrap(), "submit")
        .await;

    let response = app
        .as_admin(Method::GET, "/api/v1/quotations?status=draft&limit=2", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let response = app
        .as_admin(Method::GET, "/api/v1/quotations?status=submitted", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], submitted["id"]);
}

#[tokio::test]
async fn page_zero_is_a_bad_request() {
    let app = TestApp::new().await;
    let response = app
        .as_admin(Method::GET, "/api/v1/quotations?page=0", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
