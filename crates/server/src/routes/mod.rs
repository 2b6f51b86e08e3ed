//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited)
//! POST /signup/{customer|retailer|wholesaler}
//! POST /login/{role}
//! POST /auth/verify-account
//! POST /auth/resend-verification?email=
//! POST /auth/forgot-password
//! POST /auth/verify-otp-only
//! POST /auth/reset-password
//!
//! # Google sign-in (session backed)
//! GET  /login/google
//! GET  /auth/google
//!
//! # Catalog
//! GET  /products
//! GET  /products/{id}
//! GET  /categories
//! POST /products/add/                    - retailer, multipart
//! GET  /products/{id}/feedback
//! POST /products/{id}/feedback           - customer
//!
//! # Customer
//! GET  /customer/me
//! PATCH /customer/me/update
//! POST /customer/me/upload-pfp           - multipart
//! GET  /customer/orders
//! GET  /cart
//! POST /cart/add
//! POST /order/checkout
//!
//! # Retailer
//! GET  /retailer/me
//! GET  /retailer/my-products
//! PUT  /retailer/products/{id}
//! DELETE /retailer/products/{id}
//! GET  /retailer/orders
//! PUT  /retailer/orders/{id}/status
//! GET  /retailer/customer-history
//! GET  /retailer/wholesale-market
//! POST /retailer/wholesale-order?item_id=&quantity=
//! GET  /retailers/locations
//!
//! # Wholesaler
//! GET  /wholesaler/me
//! GET  /wholesaler/orders
//! PUT  /wholesaler/orders/{id}/status
//! ```

pub mod auth;
pub mod cart;
pub mod customer;
pub mod google;
pub mod health;
pub mod products;
pub mod retailer;
pub mod verification;
pub mod wholesaler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
};

use crate::services::uploads::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Room for multipart framing and the text fields around the file.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

/// Signup, login, and one-time-code routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup/customer", post(auth::signup_customer))
        .route("/signup/retailer", post(auth::signup_retailer))
        .route("/signup/wholesaler", post(auth::signup_wholesaler))
        .route("/login/{role}", post(auth::login))
        .route("/auth/verify-account", post(verification::verify_account))
        .route(
            "/auth/resend-verification",
            post(verification::resend_verification),
        )
        .route("/auth/forgot-password", post(verification::forgot_password))
        .route("/auth/verify-otp-only", post(verification::verify_otp_only))
        .route("/auth/reset-password", post(verification::reset_password))
}

/// Google OAuth routes. These need the session layer.
pub fn google_routes() -> Router<AppState> {
    Router::new()
        .route("/login/google", get(google::login))
        .route("/auth/google", get(google::callback))
}

/// Upload routes, which accept bodies up to the image size limit.
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/products/add/", post(products::create))
        .route("/products/add", post(products::create))
        .route("/customer/me/upload-pfp", post(customer::upload_profile_picture))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Catalog routes.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route(
            "/products/{id}/feedback",
            get(products::feedback).post(products::add_feedback),
        )
        .route("/categories", get(products::categories))
}

/// Customer account, cart, and order routes.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/customer/me", get(auth::customer_me))
        .route("/customer/me/update", patch(customer::update_me))
        .route("/customer/orders", get(customer::orders))
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/order/checkout", post(cart::checkout))
}

/// Retailer workflow routes.
pub fn retailer_routes() -> Router<AppState> {
    Router::new()
        .route("/retailer/me", get(auth::retailer_me))
        .route("/retailer/my-products", get(retailer::my_products))
        .route(
            "/retailer/products/{id}",
            put(retailer::update_product).delete(retailer::delete_product),
        )
        .route("/retailer/orders", get(retailer::orders))
        .route(
            "/retailer/orders/{id}/status",
            put(retailer::update_order_status),
        )
        .route("/retailer/customer-history", get(retailer::customer_history))
        .route("/retailer/wholesale-market", get(retailer::wholesale_market))
        .route(
            "/retailer/wholesale-order",
            post(retailer::place_wholesale_order),
        )
        .route("/retailers/locations", get(customer::retailer_locations))
}

/// Wholesaler workflow routes.
pub fn wholesaler_routes() -> Router<AppState> {
    Router::new()
        .route("/wholesaler/me", get(auth::wholesaler_me))
        .route("/wholesaler/orders", get(wholesaler::orders))
        .route(
            "/wholesaler/orders/{id}/status",
            put(wholesaler::update_order_status),
        )
}

/// Every API route that is neither auth nor Google sign-in.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(upload_routes())
        .merge(customer_routes())
        .merge(retailer_routes())
        .merge(wholesaler_routes())
}
