mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{id_of, is_invoice_number, response_json, TestApp};
use mto_backend::{
    errors::ServiceError,
    services::billing::unique_invoice_number,
    services::mailer::{InvoiceMailer, ResendMailer},
};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn resend_app(server: &MockServer) -> TestApp {
    let mailer = ResendMailer::new(
        "re_test_key".to_string(),
        server.uri(),
        "MTO Billing <billing@example.edu>".to_string(),
        Duration::from_secs(5),
    )
    .expect("mailer");
    let mailer: Arc<dyn InvoiceMailer> = Arc::new(mailer);
    TestApp::with_mailer(Some(mailer)).await
}

#[tokio::test]
async fn billing_is_idempotent() {
    let app = TestApp::new().await;
    let order_id = app.seeded_order().await;
    app.deliver_order(order_id).await;

    let first = app
        .call(
            Method::POST,
            "/api/billings",
            Some(json!({ "sales_order_id": order_id })),
            StatusCode::CREATED,
        )
        .await;
    let again = app
        .call(
            Method::POST,
            "/api/billings",
            Some(json!({ "sales_order_id": order_id })),
            StatusCode::OK,
        )
        .await;

    assert_eq!(first["data"], again["data"]);
    assert_eq!(again["message"], "Billing already exists for this order");
    assert!(is_invoice_number(
        first["data"]["invoice_number"].as_str().unwrap()
    ));
    assert_eq!(app.order_status(order_id).await, "billed");

    let listed = app.call(Method::GET, "/api/billings", None, StatusCode::OK).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let by_order = app
        .call(
            Method::GET,
            &format!("/api/billings/by-order/{}", order_id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(by_order["data"]["id"], first["data"]["id"]);

    let by_id = app
        .call(
            Method::GET,
            &format!("/api/billings/{}", id_of(&first)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(by_id["data"]["sales_order_id"], order_id);
}

#[tokio::test]
async fn billing_requires_delivered_order() {
    let app = TestApp::new().await;
    let order_id = app.seeded_order().await;

    let body = app
        .call(
            Method::POST,
            "/api/billings",
            Some(json!({ "sales_order_id": order_id })),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(
        body["detail"],
        "Invalid sales order transition from 'created' to 'billed'"
    );

    app.call(
        Method::GET,
        &format!("/api/billings/by-order/{}", order_id),
        None,
        StatusCode::NOT_FOUND,
    )
    .await;
    app.call(
        Method::POST,
        "/api/billings",
        Some(json!({ "sales_order_id": 9999 })),
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn send_invoice_without_mailer_is_bad_gateway() {
    let app = TestApp::new().await;
    let order_id = app.seeded_order().await;
    app.deliver_order(order_id).await;

    let body = app
        .call(
            Method::POST,
            "/api/billings/send-invoice",
            Some(json!({ "sales_order_id": order_id })),
            StatusCode::BAD_GATEWAY,
        )
        .await;
    assert_eq!(body["success"], false);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Invoice mailer is not configured"));

    // The billing itself was still recorded.
    app.call(
        Method::GET,
        &format!("/api/billings/by-order/{}", order_id),
        None,
        StatusCode::OK,
    )
    .await;
}

#[tokio::test]
async fn send_invoice_posts_to_resend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email_123" })))
        .expect(1)
        .mount(&server)
        .await;

    let app = resend_app(&server).await;
    let order_id = app.seeded_order().await;
    app.deliver_order(order_id).await;

    let body = app
        .call(
            Method::POST,
            "/api/billings/send-invoice",
            Some(json!({ "sales_order_id": order_id })),
            StatusCode::CREATED,
        )
        .await;
    let invoice = body["data"]["invoice_number"].as_str().unwrap().to_string();
    assert_eq!(body["message"], format!("Invoice {} sent", invoice));

    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 1);
    let payload: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(payload["from"], "MTO Billing <billing@example.edu>");
    assert_eq!(payload["to"], json!(["ana@example.edu"]));
    assert_eq!(
        payload["subject"],
        format!("Invoice {} for Sales Order #{}", invoice, order_id)
    );
    assert!(payload["html"].as_str().unwrap().contains("Dear Ana Reyes"));

    let attachment = &payload["attachments"][0];
    assert_eq!(attachment["filename"], format!("{}.pdf", invoice));
    assert_eq!(attachment["content_type"], "application/pdf");
    let document = STANDARD
        .decode(attachment["content"].as_str().unwrap())
        .unwrap();
    assert!(document.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn resend_rejection_surfaces_as_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "name": "validation_error",
            "message": "Invalid `to` field"
        })))
        .mount(&server)
        .await;

    let app = resend_app(&server).await;
    let order_id = app.seeded_order().await;
    app.deliver_order(order_id).await;

    let body = app
        .call(
            Method::POST,
            "/api/billings/send-invoice",
            Some(json!({ "sales_order_id": order_id })),
            StatusCode::BAD_GATEWAY,
        )
        .await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Resend rejected the invoice email"));
    assert_eq!(app.order_status(order_id).await, "billed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_billing_requests_bill_once() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("billing.db").display());
    let app = TestApp::with_database(&url, 4).await;

    let customer = app.create_customer("Ana Reyes", "ana@example.edu").await;
    let hoodie = app.create_product("University Hoodie", 45.0, 0).await;

    for _ in 0..5 {
        let order = app.create_order(customer, &[(hoodie, 1)]).await;
        let order_id = order["id"].as_i64().unwrap() as i32;
        app.deliver_order(order_id).await;

        let request = || {
            app.request(
                Method::POST,
                "/api/billings",
                Some(json!({ "sales_order_id": order_id })),
            )
        };
        let (first, second) = tokio::join!(request(), request());

        let mut statuses = vec![first.status(), second.status()];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CREATED]);

        let first = response_json(first).await;
        let second = response_json(second).await;
        assert_eq!(first["data"]["id"], second["data"]["id"]);
        assert_eq!(app.order_status(order_id).await, "billed");
    }

    let billings = app
        .call(Method::GET, "/api/billings", None, StatusCode::OK)
        .await;
    assert_eq!(billings["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn invoice_number_collisions_are_retried() {
    let app = TestApp::new().await;
    let order_id = app.seeded_order().await;
    app.deliver_order(order_id).await;
    let billing = app
        .call(
            Method::POST,
            "/api/billings",
            Some(json!({ "sales_order_id": order_id })),
            StatusCode::CREATED,
        )
        .await;
    let taken = billing["data"]["invoice_number"]
        .as_str()
        .unwrap()
        .to_string();

    let mut candidates =
        vec![taken.clone(), taken.clone(), "INV-1999-0001".to_string()].into_iter();
    let mut drawn = 0;
    let number = unique_invoice_number(&*app.state.db, || {
        drawn += 1;
        candidates.next().expect("candidate")
    })
    .await
    .unwrap();
    assert_eq!(number, "INV-1999-0001");
    assert_eq!(drawn, 3);

    let mut attempts = 0;
    let exhausted = unique_invoice_number(&*app.state.db, || {
        attempts += 1;
        taken.clone()
    })
    .await;
    assert_matches!(exhausted, Err(ServiceError::InternalError(_)));
    assert_eq!(attempts, 10);
}
