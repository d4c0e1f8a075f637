mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rstest::rstest;
use serde_json::{json, Value};

#[rstest]
#[case(json!({ "customer_id": 1, "items": [] }))]
#[case(json!({ "customer_id": 1, "items": [{ "product_id": 1, "quantity": 0 }] }))]
#[case(json!({ "customer_id": 1, "items": [{ "product_id": 1, "quantity": -2 }] }))]
#[case(json!({ "customer_id": 1, "items": [{ "product_id": 1, "quantity": "two" }] }))]
#[case(json!({ "customer_id": 1 }))]
#[case(json!({ "customer_id": 1, "items": [{ "product_id": 999, "quantity": 1 }] }))]
#[case(json!({ "customer_id": 999, "items": [{ "product_id": 1, "quantity": 1 }] }))]
#[tokio::test]
async fn malformed_orders_are_rejected_without_writes(#[case] payload: Value) {
    let app = TestApp::new().await;
    app.create_customer("Ana Reyes", "ana@example.edu").await;
    app.create_product("Hoodie", 45.0, 1).await;

    let body = app
        .call(Method::POST, "/api/orders", Some(payload), StatusCode::BAD_REQUEST)
        .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["timestamp"].is_string());

    let orders = app.call(Method::GET, "/api/orders", None, StatusCode::OK).await;
    assert!(orders["data"].as_array().unwrap().is_empty());
}

#[rstest]
#[case("/api/orders?status=bogus")]
#[case("/api/orders?customer_id=abc")]
#[case("/api/production-orders?status=done")]
#[case("/api/deliveries?status=shipped")]
#[tokio::test]
async fn unknown_filter_values_are_bad_requests(#[case] uri: &str) {
    let app = TestApp::new().await;
    let body = app.call(Method::GET, uri, None, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);
}

#[rstest]
#[case(Method::GET, "/api/orders/abc")]
#[case(Method::DELETE, "/api/orders/1.5")]
#[case(Method::PATCH, "/api/production-orders/first/start")]
#[case(Method::GET, "/api/billings/by-order/latest")]
#[case(Method::GET, "/api/v1/work-centers/99999999999")]
#[tokio::test]
async fn malformed_path_ids_get_the_error_body(#[case] method: Method, #[case] uri: &str) {
    let app = TestApp::new().await;
    let body = app.call(method, uri, None, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Invalid input:"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_routes_are_json_not_found() {
    let app = TestApp::new().await;
    for uri in ["/api/invoices", "/nowhere"] {
        let body = app.call(Method::GET, uri, None, StatusCode::NOT_FOUND).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["detail"], format!("Not found: No route for {}", uri));
    }
}

#[tokio::test]
async fn unknown_status_in_body_is_rejected() {
    let app = TestApp::new().await;
    let order_id = app.seeded_order().await;
    app.call(
        Method::PATCH,
        &format!("/api/orders/{}/status", order_id),
        Some(json!({ "status": "shipped" })),
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(app.order_status(order_id).await, "created");
}

#[tokio::test]
async fn request_id_is_echoed_in_headers_and_errors() {
    let app = TestApp::new().await;
    let response = app
        .request_with_headers(
            Method::GET,
            "/api/orders/31337",
            None,
            &[("x-request-id", "trace-me-42")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-me-42"
    );
    let body = response_json(response).await;
    assert_eq!(body["request_id"], "trace-me-42");

    let response = app.request(Method::GET, "/api/products", None).await;
    let generated = response
        .headers()
        .get("x-request-id")
        .expect("generated request id")
        .to_str()
        .unwrap()
        .to_string();
    let body = response_json(response).await;
    assert_eq!(body["meta"]["request_id"], generated);
}

#[tokio::test]
async fn health_endpoints_report_up() {
    let app = TestApp::new().await;

    let live = app.call(Method::GET, "/health", None, StatusCode::OK).await;
    assert_eq!(live["status"], "up");

    let ready = app.call(Method::GET, "/health/ready", None, StatusCode::OK).await;
    assert_eq!(ready["ready"], true);
    assert_eq!(ready["database"], "up");

    let version = app
        .call(Method::GET, "/health/version", None, StatusCode::OK)
        .await;
    assert_eq!(version["name"], "mto-backend");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let doc = app
        .call(Method::GET, "/api-docs/openapi.json", None, StatusCode::OK)
        .await;
    assert!(doc["paths"]["/api/orders"].is_object());
    assert!(doc["paths"]["/api/billings/send-invoice"].is_object());
}

#[tokio::test]
async fn dashboard_summarizes_orders() {
    let app = TestApp::new().await;
    let empty = app
        .call(Method::GET, "/api/dashboard/summary", None, StatusCode::OK)
        .await;
    assert_eq!(empty["data"]["total_orders"], 0);
    assert!(empty["data"]["top_products"].as_array().unwrap().is_empty());

    let customer = app.create_customer("Ana Reyes", "ana@example.edu").await;
    let hoodie = app.create_product("Hoodie", 45.0, 0).await;
    let tote = app.create_product("Tote", 12.0, 0).await;
    let mug = app.create_product("Mug", 9.5, 0).await;

    let billed = app.create_order(customer, &[(hoodie, 2), (tote, 1)]).await;
    let billed_id = billed["id"].as_i64().unwrap() as i32;
    app.deliver_order(billed_id).await;
    app.call(
        Method::POST,
        "/api/billings",
        Some(json!({ "sales_order_id": billed_id })),
        StatusCode::CREATED,
    )
    .await;

    let running = app.create_order(customer, &[(tote, 5)]).await;
    let running_id = running["id"].as_i64().unwrap() as i32;
    let production = app
        .call(
            Method::POST,
            "/api/production-orders",
            Some(json!({ "sales_order_id": running_id })),
            StatusCode::CREATED,
        )
        .await;
    app.call(
        Method::PATCH,
        &format!(
            "/api/production-orders/{}/start",
            production["data"]["id"]
        ),
        None,
        StatusCode::OK,
    )
    .await;

    let ready = app.create_order(customer, &[(mug, 1)]).await;
    let ready_id = ready["id"].as_i64().unwrap() as i32;
    let production = app
        .call(
            Method::POST,
            "/api/production-orders",
            Some(json!({ "sales_order_id": ready_id })),
            StatusCode::CREATED,
        )
        .await;
    for step in ["start", "complete"] {
        app.call(
            Method::PATCH,
            &format!(
                "/api/production-orders/{}/{}",
                production["data"]["id"], step
            ),
            None,
            StatusCode::OK,
        )
        .await;
    }

    let summary = app
        .call(Method::GET, "/api/dashboard/summary", None, StatusCode::OK)
        .await;
    let data = &summary["data"];
    assert_eq!(data["total_orders"], 3);
    assert_eq!(data["in_production"], 1);
    assert_eq!(data["ready_for_delivery"], 1);
    assert_eq!(data["billed"], 1);

    let top = data["top_products"].as_array().unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0]["name"], "Tote");
    assert_eq!(top[0]["orders"], 6);
    assert_eq!(top[1]["name"], "Hoodie");
    assert_eq!(top[1]["orders"], 2);

    let recent = data["recent_orders"].as_array().unwrap();
    assert_eq!(recent.len(), 3);
    assert!(recent.iter().all(|o| o["customer_name"] == "Ana Reyes"));
}

#[tokio::test]
async fn production_status_summary_counts_every_status() {
    let app = TestApp::new().await;
    let empty = app
        .call(
            Method::GET,
            "/api/dashboard/production-status",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(empty["data"]["total_production_orders"], 0);
    assert_eq!(
        empty["data"]["by_status"],
        json!({ "cancelled": 0, "completed": 0, "in_progress": 0, "planned": 0 })
    );
    assert!(empty["data"]["recent_production_orders"]
        .as_array()
        .unwrap()
        .is_empty());

    let customer = app.create_customer("Ana Reyes", "ana@example.edu").await;
    let tote = app.create_product("Tote", 12.0, 0).await;
    let mut production_ids = Vec::new();
    for _ in 0..3 {
        let order = app.create_order(customer, &[(tote, 1)]).await;
        let production = app
            .call(
                Method::POST,
                "/api/production-orders",
                Some(json!({ "sales_order_id": order["id"] })),
                StatusCode::CREATED,
            )
            .await;
        production_ids.push(production["data"]["id"].as_i64().unwrap());
    }
    app.call(
        Method::PATCH,
        &format!("/api/production-orders/{}/start", production_ids[0]),
        None,
        StatusCode::OK,
    )
    .await;
    app.call(
        Method::PATCH,
        &format!("/api/production-orders/{}/cancel", production_ids[1]),
        None,
        StatusCode::OK,
    )
    .await;

    let summary = app
        .call(
            Method::GET,
            "/api/dashboard/production-status",
            None,
            StatusCode::OK,
        )
        .await;
    let data = &summary["data"];
    assert_eq!(data["total_production_orders"], 3);
    assert_eq!(data["by_status"]["in_progress"], 1);
    assert_eq!(data["by_status"]["cancelled"], 1);
    assert_eq!(data["by_status"]["planned"], 1);
    assert_eq!(data["by_status"]["completed"], 0);

    let recent: Vec<i64> = data["recent_production_orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    let mut newest_first = production_ids.clone();
    newest_first.reverse();
    assert_eq!(recent, newest_first);
}

#[tokio::test]
async fn customer_order_summary_totals_history() {
    let app = TestApp::new().await;
    let ana = app.create_customer("Ana Reyes", "ana@example.edu").await;
    let other = app.create_customer("Ben Ortiz", "ben@example.edu").await;
    let hoodie = app.create_product("Hoodie", 45.0, 0).await;
    let mug = app.create_product("Mug", 9.5, 0).await;

    app.create_order(ana, &[(hoodie, 2)]).await;
    let dropped = app.create_order(ana, &[(mug, 2)]).await;
    app.create_order(other, &[(hoodie, 1)]).await;
    app.call(
        Method::PATCH,
        &format!("/api/orders/{}/status", dropped["id"]),
        Some(json!({ "status": "cancelled" })),
        StatusCode::OK,
    )
    .await;

    let summary = app
        .call(
            Method::GET,
            &format!("/api/dashboard/customers/{}/orders-summary", ana),
            None,
            StatusCode::OK,
        )
        .await;
    let data = &summary["data"];
    assert_eq!(data["customer_id"], ana);
    assert_eq!(data["customer_name"], "Ana Reyes");
    assert_eq!(data["total_orders"], 2);
    assert_eq!(data["orders_by_status"]["created"], 1);
    assert_eq!(data["orders_by_status"]["cancelled"], 1);
    assert_eq!(data["orders_by_status"]["billed"], 0);
    assert!((data["total_revenue"].as_f64().unwrap() - 109.0).abs() < 1e-9);

    let quiet = app.create_customer("Cy Lund", "cy@example.edu").await;
    let empty = app
        .call(
            Method::GET,
            &format!("/api/dashboard/customers/{}/orders-summary", quiet),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(empty["data"]["total_orders"], 0);
    assert_eq!(empty["data"]["total_revenue"].as_f64(), Some(0.0));

    let missing = app
        .call(
            Method::GET,
            "/api/dashboard/customers/4242/orders-summary",
            None,
            StatusCode::NOT_FOUND,
        )
        .await;
    assert_eq!(missing["detail"], "Not found: Customer 4242 not found");
}
