mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, TestApp};
use rstest::rstest;
use serde_json::json;

#[tokio::test]
async fn product_crud_and_search() {
    let app = TestApp::new().await;
    let hoodie = app.create_product("University Hoodie", 45.0, 4).await;
    app.create_product("Lab Coat", 32.5, 0).await;

    let found = app
        .call(Method::GET, "/api/products?search=HOOD", None, StatusCode::OK)
        .await;
    let found = found["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], hoodie);

    let updated = app
        .call(
            Method::PUT,
            &format!("/api/products/{}", hoodie),
            Some(json!({
                "name": "Zip Hoodie",
                "description": "Full zip",
                "price": 49.99,
                "image_url": "https://cdn.example.edu/hoodie.png"
            })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["data"]["name"], "Zip Hoodie");
    let price = updated["data"]["price"].as_f64().unwrap();
    assert!((price - 49.99).abs() < 1e-9, "price was {}", price);
    assert_eq!(updated["data"]["stock_qty"], 4);

    let restocked = app
        .call(
            Method::PATCH,
            &format!("/api/products/{}/restock", hoodie),
            Some(json!({ "quantity": 6 })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(restocked["data"]["stock_qty"], 10);

    app.call(
        Method::DELETE,
        &format!("/api/products/{}", hoodie),
        None,
        StatusCode::OK,
    )
    .await;
    app.call(
        Method::GET,
        &format!("/api/products/{}", hoodie),
        None,
        StatusCode::NOT_FOUND,
    )
    .await;

    let remaining = app.call(Method::GET, "/api/products", None, StatusCode::OK).await;
    assert_eq!(remaining["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let app = TestApp::new().await;
    let discounted = app.create_product("Mug 100% Recycled", 9.5, 0).await;
    let underscored = app.create_product("Tote_Bag", 12.0, 0).await;
    app.create_product("Tote Bag", 12.0, 0).await;

    let percent = app
        .call(Method::GET, "/api/products?search=%25", None, StatusCode::OK)
        .await;
    let percent = percent["data"].as_array().unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0]["id"], discounted);

    let underscore = app
        .call(Method::GET, "/api/products?search=e_b", None, StatusCode::OK)
        .await;
    let underscore = underscore["data"].as_array().unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0]["id"], underscored);
}

#[rstest]
#[case(json!({ "name": "Mug", "price": 0 }))]
#[case(json!({ "name": "Mug", "price": -3.5 }))]
#[case(json!({ "name": "", "price": 10 }))]
#[case(json!({ "name": "Mug", "price": 10, "stock_qty": -1 }))]
#[case(json!({ "name": "Mug", "price": 10, "image_url": "not a url" }))]
#[case(json!({ "name": "Mug" }))]
#[tokio::test]
async fn invalid_products_are_rejected(#[case] payload: serde_json::Value) {
    let app = TestApp::new().await;
    let body = app
        .call(Method::POST, "/api/products", Some(payload), StatusCode::BAD_REQUEST)
        .await;
    assert_eq!(body["success"], false);

    let listed = app.call(Method::GET, "/api/products", None, StatusCode::OK).await;
    assert!(listed["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn restock_requires_positive_quantity() {
    let app = TestApp::new().await;
    let product = app.create_product("Tumbler", 18.75, 2).await;

    for quantity in [0, -4] {
        app.call(
            Method::PATCH,
            &format!("/api/products/{}/restock", product),
            Some(json!({ "quantity": quantity })),
            StatusCode::BAD_REQUEST,
        )
        .await;
    }
    app.call(
        Method::PATCH,
        "/api/products/777/restock",
        Some(json!({ "quantity": 1 })),
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn ordered_product_cannot_be_deleted() {
    let app = TestApp::new().await;
    let customer = app.create_customer("Ana Reyes", "ana@example.edu").await;
    let product = app.create_product("Stole", 28.0, 0).await;
    app.create_order(customer, &[(product, 1)]).await;

    let body = app
        .call(
            Method::DELETE,
            &format!("/api/products/{}", product),
            None,
            StatusCode::CONFLICT,
        )
        .await;
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn customers_search_and_paginate() {
    let app = TestApp::new().await;
    for n in 1..=5 {
        app.create_customer(&format!("Student {}", n), &format!("student{}@example.edu", n))
            .await;
    }
    let faculty = app
        .call(
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "name": "Dr. Miguel Santos",
                "email": "MSantos@Example.edu",
                "role": "faculty",
                "phone": "+63 2 555 0101"
            })),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(faculty["data"]["email"], "msantos@example.edu");
    assert_eq!(faculty["data"]["role"], "faculty");

    let page = app
        .call(Method::GET, "/api/v1/customers?page=2&size=4", None, StatusCode::OK)
        .await;
    let data = &page["data"];
    assert_eq!(data["total"], 6);
    assert_eq!(data["pages"], 2);
    assert_eq!(data["page"], 2);
    assert_eq!(data["customers"].as_array().unwrap().len(), 2);

    // Paginated search covers email as well as name.
    let by_email = app
        .call(Method::GET, "/api/v1/customers?search=msantos", None, StatusCode::OK)
        .await;
    assert_eq!(by_email["data"]["total"], 1);

    let by_name = app
        .call(Method::GET, "/api/customers?search=student", None, StatusCode::OK)
        .await;
    let names: Vec<&str> = by_name["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Student 1", "Student 2", "Student 3", "Student 4", "Student 5"]);

    app.call(
        Method::GET,
        &format!("/api/v1/customers/{}", id_of(&faculty)),
        None,
        StatusCode::OK,
    )
    .await;
}

#[rstest]
#[case("/api/v1/customers?page=0")]
#[case("/api/v1/customers?size=0")]
#[case("/api/v1/customers?size=101")]
#[case("/api/v1/work-centers?page=0")]
#[case("/api/v1/work-centers?size=abc")]
#[tokio::test]
async fn invalid_pagination_is_rejected(#[case] uri: &str) {
    let app = TestApp::new().await;
    app.call(Method::GET, uri, None, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn customer_validation() {
    let app = TestApp::new().await;
    for payload in [
        json!({ "name": "Ana", "email": "nope" }),
        json!({ "name": "", "email": "ana@example.edu" }),
        json!({ "name": "Ana", "email": "ana@example.edu", "role": "alumni" }),
    ] {
        app.call(
            Method::POST,
            "/api/v1/customers",
            Some(payload),
            StatusCode::BAD_REQUEST,
        )
        .await;
    }
}

#[tokio::test]
async fn work_center_crud() {
    let app = TestApp::new().await;
    let print_shop = app.create_work_center("Print Shop").await;
    app.create_work_center("Embroidery Room").await;

    let page = app
        .call(Method::GET, "/api/v1/work-centers?page=1&size=1", None, StatusCode::OK)
        .await;
    assert_eq!(page["data"]["total"], 2);
    assert_eq!(page["data"]["pages"], 2);
    assert_eq!(page["data"]["work_centers"][0]["name"], "Print Shop");

    let updated = app
        .call(
            Method::PUT,
            &format!("/api/v1/work-centers/{}", print_shop),
            Some(json!({ "description": "Screen printing and DTF" })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["data"]["name"], "Print Shop");
    assert_eq!(updated["data"]["description"], "Screen printing and DTF");
    assert_eq!(updated["data"]["address"], "Building C");

    app.call(
        Method::PUT,
        &format!("/api/v1/work-centers/{}", print_shop),
        Some(json!({ "name": "x".repeat(101) })),
        StatusCode::BAD_REQUEST,
    )
    .await;

    app.call(
        Method::DELETE,
        &format!("/api/v1/work-centers/{}", print_shop),
        None,
        StatusCode::OK,
    )
    .await;
    app.call(
        Method::GET,
        &format!("/api/v1/work-centers/{}", print_shop),
        None,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn work_center_in_use_cannot_be_deleted() {
    let app = TestApp::new().await;
    let order_id = app.seeded_order().await;
    let work_center = app.create_work_center("Engraving Lab").await;
    app.call(
        Method::POST,
        "/api/production-orders",
        Some(json!({ "sales_order_id": order_id, "work_center_id": work_center })),
        StatusCode::CREATED,
    )
    .await;

    app.call(
        Method::DELETE,
        &format!("/api/v1/work-centers/{}", work_center),
        None,
        StatusCode::CONFLICT,
    )
    .await;
}
