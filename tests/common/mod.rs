#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use mto_backend::{
    build_router,
    config::AppConfig,
    db,
    events::{self, EventSender},
    services::mailer::InvoiceMailer,
    AppState,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Helper harness for spinning up the application over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_mailer(None).await
    }

    pub async fn with_mailer(mailer: Option<Arc<dyn InvoiceMailer>>) -> Self {
        // One connection so every query sees the same in-memory database.
        Self::build("sqlite::memory:", 1, mailer).await
    }

    /// Application over a caller-provided database, e.g. a SQLite file shared
    /// by several pooled connections.
    pub async fn with_database(database_url: &str, max_connections: u32) -> Self {
        Self::build(database_url, max_connections, None).await
    }

    async fn build(
        database_url: &str,
        max_connections: u32,
        mailer: Option<Arc<dyn InvoiceMailer>>,
    ) -> Self {
        let mut cfg = AppConfig::new(
            database_url.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = max_connections;
        cfg.db_min_connections = 1;
        cfg.cors_allow_any_origin = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(event_tx), mailer);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
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

    /// Sends the request, asserts the status and returns the parsed body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let response = self.request(method.clone(), uri, body).await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, expected, "{} {} returned {}", method, uri, json);
        json
    }

    pub async fn create_customer(&self, name: &str, email: &str) -> i32 {
        let body = self
            .call(
                Method::POST,
                "/api/v1/customers",
                Some(json!({ "name": name, "email": email })),
                StatusCode::CREATED,
            )
            .await;
        id_of(&body)
    }

    pub async fn create_product(&self, name: &str, price: f64, stock_qty: i32) -> i32 {
        let body = self
            .call(
                Method::POST,
                "/api/products",
                Some(json!({
                    "name": name,
                    "description": format!("{} for the campus store", name),
                    "price": price,
                    "stock_qty": stock_qty
                })),
                StatusCode::CREATED,
            )
            .await;
        id_of(&body)
    }

    pub async fn create_work_center(&self, name: &str) -> i32 {
        let body = self
            .call(
                Method::POST,
                "/api/v1/work-centers",
                Some(json!({ "name": name, "address": "Building C" })),
                StatusCode::CREATED,
            )
            .await;
        id_of(&body)
    }

    /// Creates an order and returns its details payload (`data`).
    pub async fn create_order(&self, customer_id: i32, items: &[(i32, i32)]) -> Value {
        let items: Vec<Value> = items
            .iter()
            .map(|(product_id, quantity)| json!({ "product_id": product_id, "quantity": quantity }))
            .collect();
        let body = self
            .call(
                Method::POST,
                "/api/orders",
                Some(json!({ "customer_id": customer_id, "items": items })),
                StatusCode::CREATED,
            )
            .await;
        body["data"].clone()
    }

    /// Customer, product and a `created` order for 2 x 45.00.
    pub async fn seeded_order(&self) -> i32 {
        let customer_id = self.create_customer("Ana Reyes", "ana@example.edu").await;
        let product_id = self.create_product("University Hoodie", 45.0, 10).await;
        let order = self.create_order(customer_id, &[(product_id, 2)]).await;
        order["id"].as_i64().expect("order id") as i32
    }

    /// Walks an order through production and delivery; returns the production
    /// order id and delivery id.
    pub async fn deliver_order(&self, order_id: i32) -> (i32, i32) {
        let production = self
            .call(
                Method::POST,
                "/api/production-orders",
                Some(json!({ "sales_order_id": order_id })),
                StatusCode::CREATED,
            )
            .await;
        let production_id = id_of(&production);
        self.call(
            Method::PATCH,
            &format!("/api/production-orders/{}/start", production_id),
            None,
            StatusCode::OK,
        )
        .await;
        self.call(
            Method::PATCH,
            &format!("/api/production-orders/{}/complete", production_id),
            None,
            StatusCode::OK,
        )
        .await;

        let delivery = self
            .call(
                Method::POST,
                "/api/deliveries",
                Some(json!({ "sales_order_id": order_id })),
                StatusCode::CREATED,
            )
            .await;
        let delivery_id = id_of(&delivery);
        self.call(
            Method::PATCH,
            &format!("/api/deliveries/{}/complete", delivery_id),
            None,
            StatusCode::OK,
        )
        .await;

        (production_id, delivery_id)
    }

    pub async fn order_status(&self, order_id: i32) -> String {
        let body = self
            .call(
                Method::GET,
                &format!("/api/orders/{}", order_id),
                None,
                StatusCode::OK,
            )
            .await;
        body["data"]["status"]
            .as_str()
            .expect("status string")
            .to_string()
    }
}

/// `data.id` of an envelope.
pub fn id_of(body: &Value) -> i32 {
    body["data"]["id"].as_i64().expect("data.id in response") as i32
}

pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

/// `INV-YYYY-NNNN`
pub fn is_invoice_number(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    parts.len() == 3
        && parts[0] == "INV"
        && parts[1].len() == 4
        && parts[1].chars().all(|c| c.is_ascii_digit())
        && parts[2].len() == 4
        && parts[2].chars().all(|c| c.is_ascii_digit())
}
