//! Integration tests for Live MART.
//!
//! The tests talk to a running server over HTTP and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! lm-cli migrate
//! lm-cli seed --reset
//! LIVEMART_TRUST_PROXY_HEADERS=true cargo run -p live-mart-server &
//! cargo test -p live-mart-integration-tests -- --ignored
//! ```
//!
//! Set `LIVEMART_TEST_URL` to point at a server other than
//! `http://localhost:8000`. Tests that arrange rows directly read
//! `LIVEMART_DATABASE_URL` (or `DATABASE_URL`) for the same database the
//! server uses.
//!
//! The concurrency tests act as several shoppers at once. Each one sends
//! its own `X-Forwarded-For` address (see [`client_as`]) so the per-client
//! rate limits apply per shopper, which needs the server to trust proxy
//! headers.

use live_mart_core::Role;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Seeded customer used by the order tests.
pub const SEEDED_CUSTOMER: (&str, &str) = ("customer1@gmail.com", "cust123");
/// Seeded retailer used by the retailer tests.
pub const SEEDED_RETAILER: (&str, &str) = ("retailer1@shop.com", "retail123");
/// Seeded wholesaler used by the wholesaler tests.
pub const SEEDED_WHOLESALER: (&str, &str) = ("wholesaler1@supply.com", "whole123");

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("LIVEMART_TEST_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Absolute URL for an API path.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A plain HTTP client. Redirects are not followed so tests can inspect
/// them.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A client that presents itself as `forwarded_for` through
/// `X-Forwarded-For`.
///
/// # Panics
///
/// Panics if the address is not a valid header value or the client cannot
/// be built.
#[must_use]
pub fn client_as(forwarded_for: &str) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(forwarded_for).expect("Invalid forwarded address"),
    );
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// An address nobody else is using, so signups never collide.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}+{}@example.com", uuid::Uuid::new_v4().simple())
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
}

/// Log in and return the bearer token.
///
/// # Panics
///
/// Panics if the request fails or the login is rejected.
pub async fn login(client: &Client, role: Role, mail: &str, password: &str) -> String {
    let resp = client
        .post(url(&format!("/login/{role}")))
        .json(&json!({ "mail": mail, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(resp.status(), StatusCode::OK, "login failed for {mail}");
    resp.json::<TokenBody>()
        .await
        .expect("Failed to parse token response")
        .access_token
}

/// A small pool on the server's database, for arranging rows the API does
/// not expose.
///
/// # Panics
///
/// Panics if no database URL is set or the connection fails.
pub async fn db_pool() -> PgPool {
    let database_url = std::env::var("LIVEMART_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("LIVEMART_DATABASE_URL or DATABASE_URL must be set");

    PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database")
}

/// Insert a product owned by the retailer with this mail and return its ID.
///
/// # Panics
///
/// Panics if the retailer does not exist or the insert fails.
pub async fn insert_product(pool: &PgPool, retailer_mail: &str, name: &str, stock: i32) -> i32 {
    sqlx::query_scalar(
        r"
        INSERT INTO products (name, description, price, stock, retailer_id)
        SELECT $2, 'Created by integration tests', 9.99, $3, id
        FROM retailers WHERE mail = $1
        RETURNING id
        ",
    )
    .bind(retailer_mail)
    .bind(name)
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("Failed to insert product")
}

/// Current stock of a product, read from the public product endpoint.
///
/// # Panics
///
/// Panics if the request fails or the product is missing.
pub async fn product_stock(client: &Client, product_id: i32) -> i64 {
    let product: serde_json::Value = client
        .get(url(&format!("/products/{product_id}")))
        .send()
        .await
        .expect("Failed to fetch product")
        .json()
        .await
        .expect("Failed to parse product");
    product["stock"].as_i64().expect("product has no stock field")
}

/// Remove every line from the customer's cart by adding the negated
/// quantity of each.
///
/// # Panics
///
/// Panics if a request fails.
pub async fn empty_cart(client: &Client, token: &str) {
    let cart: serde_json::Value = client
        .get(url("/cart"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to fetch cart")
        .json()
        .await
        .expect("Failed to parse cart");

    for line in cart["items"].as_array().into_iter().flatten() {
        let quantity = line["quantity"].as_i64().unwrap_or(0);
        let resp = client
            .post(url("/cart/add"))
            .bearer_auth(token)
            .json(&json!({
                "product_id": line["product_id"],
                "quantity": -quantity,
            }))
            .send()
            .await
            .expect("Failed to send cart update");
        assert_eq!(resp.status(), StatusCode::OK, "could not clear cart line");
    }
}
