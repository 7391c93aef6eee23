//! Integration tests for the Zahra Fashion storefront.
//!
//! Tests drive the real router, middleware and session layer in process with
//! `tower::ServiceExt::oneshot`. Persistence is the in-memory [`MemoryStore`],
//! sessions use `tower_sessions::MemoryStore`, and uploads land in a temporary
//! directory, so no database or running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p zahra-integration-tests
//! ```
//!
//! # Layout
//!
//! - [`TestApp`] owns the router, the store and the upload directory.
//! - [`Shopper`] is one browser: it keeps its own cookie jar, so two shoppers
//!   never share a guest cart or a login session.

use std::collections::BTreeMap;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use tower_sessions::cookie::{Cookie, time::Duration};

use zahra_core::{CategoryId, ProductId};
use zahra_storefront::config::StorefrontConfig;
use zahra_storefront::db::{MemoryStore, Store};
use zahra_storefront::middleware::session_layer_with_store;
use zahra_storefront::models::{Category, NewProduct, Product};
use zahra_storefront::state::AppState;
use zahra_storefront::{app, routes};

/// Largest response body the helpers will buffer.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Upload limit used by every test app.
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// A 1x1 PNG.
pub const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// The storefront wired over in-memory backends.
pub struct TestApp {
    router: Router,
    store: MemoryStore,
    uploads: TempDir,
}

impl TestApp {
    /// Build an app with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the temporary upload directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().expect("create upload dir");
        let upload_dir = uploads.path().display().to_string();
        let max_upload = TEST_MAX_UPLOAD_BYTES.to_string();

        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_DATABASE_URL" => Some("postgres://localhost/zahra_test".to_owned()),
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_owned()),
            "STOREFRONT_UPLOAD_DIR" => Some(upload_dir.clone()),
            "STOREFRONT_MAX_UPLOAD_BYTES" => Some(max_upload.clone()),
            _ => None,
        })
        .expect("test configuration is valid");

        let store = MemoryStore::new();
        let session_layer =
            session_layer_with_store(tower_sessions::MemoryStore::default(), &config);
        let state = AppState::new(config, store.clone());
        let router = app(state, session_layer, routes::routes());

        Self {
            router,
            store,
            uploads,
        }
    }

    /// The backing store, for seeding and inspecting rows directly.
    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Names of the files written to the upload directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be read.
    #[must_use]
    pub fn stored_uploads(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.uploads.path())
            .expect("read upload dir")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// A new browser with an empty cookie jar.
    #[must_use]
    pub fn shopper(&self) -> Shopper {
        Shopper {
            router: self.router.clone(),
            cookies: BTreeMap::new(),
        }
    }

    /// Insert a category.
    #[must_use]
    pub fn category(&self, name: &str, slug: &str) -> Category {
        self.store.add_category(name, slug)
    }

    /// Insert a product priced in whole rupees.
    ///
    /// # Panics
    ///
    /// Panics if the category does not exist.
    pub async fn product(&self, category: CategoryId, name: &str, price: i64) -> Product {
        self.store
            .create_product(&NewProduct {
                name: name.to_owned(),
                description: None,
                price: Decimal::new(price * 100, 2),
                category_id: category,
                image_url: None,
                stock_quantity: 10,
                is_featured: false,
            })
            .await
            .expect("seed product")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    /// The body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or_else(|e| {
            panic!(
                "response is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.bytes)
            )
        })
    }

    /// The `Set-Cookie` header for `name`, if the response set one.
    #[must_use]
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&format!("{name}=")))
            .map(str::to_owned)
    }
}

/// One browser talking to a [`TestApp`].
pub struct Shopper {
    router: Router,
    cookies: BTreeMap<String, String>,
}

impl Shopper {
    /// Send a request, attaching and then updating this shopper's cookies.
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be buffered.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request.headers_mut().insert(
                header::COOKIE,
                cookie.parse().expect("cookie header is valid"),
            );
        }

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(infallible) => match infallible {},
        };
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .expect("buffer response body")
            .to_vec();

        for value in parts.headers.get_all(header::SET_COOKIE) {
            let Some(cookie) = value
                .to_str()
                .ok()
                .and_then(|v| Cookie::parse(v.to_owned()).ok())
            else {
                continue;
            };
            if cookie.value().is_empty() || cookie.max_age() == Some(Duration::ZERO) {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies
                    .insert(cookie.name().to_owned(), cookie.value().to_owned());
            }
        }

        TestResponse {
            status: parts.status,
            headers: parts.headers,
            bytes,
        }
    }

    /// The value of a cookie currently held by this shopper.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(empty(Method::GET, uri)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(empty(Method::DELETE, uri)).await
    }

    pub async fn post_json(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(with_json(Method::POST, uri, body)).await
    }

    pub async fn put_json(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(with_json(Method::PUT, uri, body)).await
    }

    pub async fn post_form(&mut self, uri: &str, form: MultipartBody) -> TestResponse {
        self.send(form.into_request(Method::POST, uri)).await
    }

    pub async fn put_form(&mut self, uri: &str, form: MultipartBody) -> TestResponse {
        self.send(form.into_request(Method::PUT, uri)).await
    }

    /// Add a product to this shopper's cart, asserting success.
    pub async fn add_to_cart(&mut self, product: ProductId, quantity: i32) {
        let response = self
            .post_json(
                "/cart",
                &json!({ "productId": product, "quantity": quantity }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.json());
    }

    /// Register and sign in, asserting success.
    pub async fn register(&mut self, email: &str, password: &str) -> Value {
        let response = self
            .post_json(
                "/auth/register",
                &json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.json());
        response.json()
    }
}

fn empty(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request is valid")
}

fn with_json(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request is valid")
}

/// A `multipart/form-data` body built field by field.
#[derive(Debug, Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    const BOUNDARY: &'static str = "zahra-test-boundary";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                Self::BOUNDARY
            )
            .as_bytes(),
        );
        self
    }

    #[must_use]
    pub fn file(mut self, name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"upload\"\r\n\
                 Content-Type: {content_type}\r\n\r\n",
                Self::BOUNDARY
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    fn into_request(mut self, method: Method, uri: &str) -> Request<Body> {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", Self::BOUNDARY).as_bytes());
        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", Self::BOUNDARY),
            )
            .body(Body::from(self.bytes))
            .expect("request is valid")
    }
}

/// Read a JSON decimal, which is serialized as a string.
///
/// # Panics
///
/// Panics if the value is not a decimal.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}

/// A complete checkout body for the given `(product, name, price, quantity)` lines.
#[must_use]
pub fn checkout(lines: &[(ProductId, &str, i64, i32)], payment_method: &str) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, name, price, quantity)| {
            json!({
                "productId": id,
                "name": name,
                "price": price.to_string(),
                "quantity": quantity,
            })
        })
        .collect();
    json!({
        "customerName": "Ayesha Khan",
        "customerPhone": "03001234567",
        "customerEmail": "ayesha@example.pk",
        "deliveryAddress": "12 Main Boulevard, Gulberg",
        "city": "Lahore",
        "postalCode": "54000",
        "paymentMethod": payment_method,
        "cartItems": items,
    })
}
