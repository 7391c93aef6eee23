//! Catalog browsing, accounts and the cross-cutting middleware.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Request, StatusCode};
use serde_json::json;

use zahra_integration_tests::{MultipartBody, TestApp};

#[tokio::test]
async fn health_endpoints() {
    let app = TestApp::new();
    let mut client = app.shopper();

    let live = client.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.bytes, b"ok");

    let ready = client.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let app = TestApp::new();
    let mut client = app.shopper();

    let response = client.get("/categories").await;
    assert_eq!(response.headers["x-frame-options"], "DENY");
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["referrer-policy"], "no-referrer");
    assert!(response.headers.contains_key("content-security-policy"));
    assert!(!response.headers["x-request-id"].is_empty());

    let request = Request::builder()
        .uri("/categories")
        .header("x-request-id", "checkout-trace-42")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = client.send(request).await;
    assert_eq!(response.headers["x-request-id"], "checkout-trace-42");
}

#[tokio::test]
async fn catalog_lists_and_filters() {
    let app = TestApp::new();
    let lawn = app.category("Lawn Collection", "lawn");
    let bridal = app.category("Bridal", "bridal");
    app.product(lawn.id, "Printed Kurta", 2200).await;
    app.product(bridal.id, "Lehenga", 85_000).await;
    let mut client = app.shopper();

    let form = MultipartBody::new()
        .text("name", "Embroidered Lawn Suit")
        .text("price", "4500")
        .text("categoryId", &lawn.id.to_string())
        .text("isFeatured", "true");
    assert_eq!(client.post_form("/admin/products", form).await.status, StatusCode::OK);

    let categories = client.get("/categories").await.json();
    let names: Vec<&str> = categories["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Bridal", "Lawn Collection"]);

    let all = client.get("/products").await.json();
    assert_eq!(all["products"].as_array().unwrap().len(), 3);

    let lawn_only = client.get("/products?category=lawn").await.json();
    let lawn_only = lawn_only["products"].as_array().unwrap();
    assert_eq!(lawn_only.len(), 2);
    assert!(lawn_only.iter().all(|p| p["category_slug"] == "lawn"));

    let featured = client.get("/products?featured=true").await.json();
    let featured = featured["products"].as_array().unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0]["name"], "Embroidered Lawn Suit");

    let limited = client.get("/products?limit=1").await.json();
    assert_eq!(limited["products"].as_array().unwrap().len(), 1);

    let response = client.get("/products?limit=-1").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_detail_and_missing_products() {
    let app = TestApp::new();
    let lawn = app.category("Lawn Collection", "lawn");
    let kurta = app.product(lawn.id, "Printed Kurta", 2200).await;
    let mut client = app.shopper();

    let response = client.get(&format!("/products/{}", kurta.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    let product = &response.json()["product"];
    assert_eq!(product["name"], "Printed Kurta");
    assert_eq!(product["category_name"], "Lawn Collection");

    assert_eq!(client.get("/products/9999").await.status, StatusCode::NOT_FOUND);
    assert_eq!(client.get("/products/kurta").await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_login_logout() {
    let app = TestApp::new();
    let mut shopper = app.shopper();

    assert_eq!(shopper.get("/auth/me").await.status, StatusCode::UNAUTHORIZED);

    let registered = shopper.register("Maryam@Example.pk", "long enough").await;
    assert_eq!(registered["user"]["email"], "maryam@example.pk");
    assert!(registered["user"].get("password_hash").is_none());
    assert!(shopper.cookie("zahra_session").is_some());

    let me = shopper.get("/auth/me").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["user"]["email"], "maryam@example.pk");

    let response = shopper.post_json("/auth/logout", &json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(shopper.get("/auth/me").await.status, StatusCode::UNAUTHORIZED);

    let response = shopper
        .post_json(
            "/auth/login",
            &json!({ "email": "maryam@example.pk", "password": "long enough" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(shopper.get("/auth/me").await.status, StatusCode::OK);
}

#[tokio::test]
async fn auth_failures() {
    let app = TestApp::new();
    let mut shopper = app.shopper();
    shopper.register("fatima@example.pk", "long enough").await;

    let mut other = app.shopper();
    let duplicate = other
        .post_json(
            "/auth/register",
            &json!({ "email": "FATIMA@example.pk", "password": "another one" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let short = other
        .post_json(
            "/auth/register",
            &json!({ "email": "zara@example.pk", "password": "short" }),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let wrong = other
        .post_json(
            "/auth/login",
            &json!({ "email": "fatima@example.pk", "password": "not the one" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let unknown = other
        .post_json(
            "/auth/login",
            &json!({ "email": "nobody@example.pk", "password": "long enough" }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.json(), wrong.json());
    assert_eq!(other.get("/auth/me").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let app = TestApp::new();
    let mut client = app.shopper();
    let response = client.get("/wishlist").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
