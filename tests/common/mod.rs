#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use tradedesk_api::{
    build_router,
    config::AppConfig,
    db,
    entities::{branch, customer, product, stock_level, supplier, user, warehouse},
    events::{self, EventSender},
    AppState,
};
use uuid::Uuid;

const TEST_JWT_SECRET: &str =
    "integration-test-secret-0123456789-abcdefghijklmnopqrstuvwxyz-ABCDEFGHIJ";

/// Reference rows every test starts with: a head office and one regional
/// branch, each with a warehouse, plus products and counterparties.
pub struct Seed {
    pub head_office: branch::Model,
    pub surabaya: branch::Model,
    pub jakarta_warehouse: warehouse::Model,
    pub surabaya_warehouse: warehouse::Model,
    pub excavator: product::Model,
    pub crane: product::Model,
    pub customer: customer::Model,
    pub supplier: supplier::Model,
}

/// Application backed by an in-memory SQLite database with three users:
/// an HQ admin, a Surabaya branch officer and a read-only viewer.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub seed: Seed,
    pub admin_token: String,
    pub branch_token: String,
    pub viewer_token: String,
    _event_task: tokio::task::JoinHandle<()>,
    _dir: Option<TempDir>,
}

impl TestApp {
    pub async fn new() -> Self {
        // one connection keeps the in-memory database alive and shared
        Self::build("sqlite::memory:".to_string(), 1, None).await
    }

    /// Application on a WAL-mode SQLite file with a pool of `connections`,
    /// so concurrent requests run in overlapping transactions.
    pub async fn with_file_database(connections: u32) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("tradedesk.db").display()
        );
        Self::build(url, connections, Some(dir)).await
    }

    async fn build(database_url: String, connections: u32, dir: Option<TempDir>) -> Self {
        let mut cfg = AppConfig::new(
            database_url,
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = connections;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        if dir.is_some() {
            pool.execute_unprepared("PRAGMA journal_mode=WAL")
                .await
                .expect("failed to enable WAL");
        }
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, cfg, event_sender);
        let seed = seed_reference_data(&state).await;

        let admin = seed_user(&state, "Rina Admin", "rina@tradedesk.test", Some(seed.head_office.id)).await;
        let officer = seed_user(&state, "Budi Sales", "budi@tradedesk.test", Some(seed.surabaya.id)).await;
        let viewer = seed_user(&state, "Sari Viewer", "sari@tradedesk.test", Some(seed.surabaya.id)).await;

        let admin_token = issue(&state, &admin, vec!["admin"], vec!["*"]);
        let branch_token = issue(
            &state,
            &officer,
            vec!["sales"],
            vec![
                "quotations:*",
                "invoices:*",
                "delivery_notes:*",
                "imports:*",
                "inventory:*",
                "reference:read",
                "dashboard:read",
            ],
        );
        let viewer_token = issue(&state, &viewer, vec!["viewer"], vec!["quotations:read"]);

        let router = build_router(state.clone());

        Self {
            router,
            state,
            seed,
            admin_token,
            branch_token,
            viewer_token,
            _event_task: event_task,
            _dir: dir,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn as_admin(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(&self.admin_token)).await
    }

    pub async fn as_branch(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(&self.branch_token)).await
    }

    /// Quotation payload with two lines: 2 excavators and 1 crane.
    pub fn quotation_payload(&self, branch_id: Uuid) -> Value {
        json!({
            "branch_id": branch_id,
            "customer_id": self.seed.customer.id,
            "notes": "Q3 fleet renewal",
            "items": [
                { "product_id": self.seed.excavator.id, "quantity": 2, "unit_price": "1250000.50" },
                { "product_id": self.seed.crane.id, "quantity": "1", "unit_price": 980000 }
            ]
        })
    }

    /// Creates a quotation as the admin and returns the response `data`.
    pub async fn create_quotation(&self, branch_id: Uuid) -> Value {
        let response = self
            .as_admin(
                Method::POST,
                "/api/v1/quotations",
                Some(self.quotation_payload(branch_id)),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await["data"].clone()
    }

    /// Creates a pending import into `warehouse_id` and returns the response `data`.
    pub async fn create_import(&self, branch_id: Uuid, warehouse_id: Uuid, quantity: u32) -> Value {
        let response = self
            .as_admin(
                Method::POST,
                "/api/v1/imports",
                Some(json!({
                    "branch_id": branch_id,
                    "supplier_id": self.seed.supplier.id,
                    "warehouse_id": warehouse_id,
                    "currency": "usd",
                    "exchange_rate": "15500",
                    "items": [
                        { "product_id": self.seed.excavator.id, "quantity": quantity, "unit_price": "85000" }
                    ]
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await["data"].clone()
    }

    pub async fn transition(&self, resource: &str, id: &str, action: &str) -> Response {
        self.as_admin(
            Method::POST,
            &format!("/api/v1/{}/{}/{}", resource, id, action),
            None,
        )
        .await
    }

    pub async fn seed_stock(&self, warehouse_id: Uuid, product_id: Uuid, quantity: Decimal) {
        stock_level::ActiveModel {
            id: Set(Uuid::new_v4()),
            warehouse_id: Set(warehouse_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            updated_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed stock level");
    }

    /// On-hand quantity as reported by `GET /stock`, zero when no row exists.
    pub async fn on_hand(&self, warehouse_id: Uuid, product_id: Uuid) -> Decimal {
        let response = self
            .as_admin(
                Method::GET,
                &format!(
                    "/api/v1/stock?warehouse_id={}&product_id={}",
                    warehouse_id, product_id
                ),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        body["data"]["items"]
            .as_array()
            .and_then(|items| items.first())
            .map(|level| decimal(&level["quantity"]))
            .unwrap_or(Decimal::ZERO)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Reads a decimal that may be serialized as a string or a number, rounded
/// to two places.
pub fn decimal(value: &Value) -> Decimal {
    let parsed = match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal: {}", other),
    };
    parsed.round_dp(2)
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal literal")
}

async fn seed_reference_data(state: &AppState) -> Seed {
    let conn = &*state.db;
    let now = Utc::now();

    let head_office = branch::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("HQ Jakarta".to_string()),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .expect("seed head office");

    let surabaya = branch::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Surabaya".to_string()),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .expect("seed branch");

    let jakarta_warehouse = warehouse::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Cakung Yard".to_string()),
        branch_id: Set(head_office.id),
        location: Set(Some("Jakarta Timur".to_string())),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .expect("seed HQ warehouse");

    let surabaya_warehouse = warehouse::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Rungkut Depot".to_string()),
        branch_id: Set(surabaya.id),
        location: Set(None),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .expect("seed branch warehouse");

    let excavator = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set("EXC-320".to_string()),
        name: Set("Excavator 20t".to_string()),
        description: Set(None),
        unit_price: Set(dec("1250000.50")),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .expect("seed excavator");

    let crane = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set("CRN-50".to_string()),
        name: Set("Mobile crane 50t".to_string()),
        description: Set(Some("Rough terrain".to_string())),
        unit_price: Set(dec("980000")),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .expect("seed crane");

    let customer = customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("PT Bangun Karya".to_string()),
        email: Set(Some("procurement@bangunkarya.test".to_string())),
        phone: Set(None),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .expect("seed customer");

    let supplier = supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Osaka Heavy Machinery".to_string()),
        country: Set(Some("Japan".to_string())),
        email: Set(None),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .expect("seed supplier");

    Seed {
        head_office,
        surabaya,
        jakarta_warehouse,
        surabaya_warehouse,
        excavator,
        crane,
        customer,
        supplier,
    }
}

async fn seed_user(state: &AppState, name: &str, email: &str, branch_id: Option<Uuid>) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        branch_id: Set(branch_id),
        active: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(&*state.db)
    .await
    .expect("seed user")
}

fn issue(state: &AppState, user: &user::Model, roles: Vec<&str>, permissions: Vec<&str>) -> String {
    state
        .auth
        .issue_token(
            user.id,
            Some(user.name.clone()),
            Some(user.email.clone()),
            roles.into_iter().map(String::from).collect(),
            permissions.into_iter().map(String::from).collect(),
        )
        .expect("issue test token")
}
