//! Live MART API server library.
//!
//! Exposes the router as a library so the binary and the tests build the
//! same application.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, http::Request, routing::get};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use services::uploads::{PRODUCT_IMAGES, PROFILE_PICTURES};
use state::AppState;

/// Build the full application router.
///
/// # Middleware Order (outermost first)
///
/// 1. Sentry hub and HTTP transaction
/// 2. `TraceLayer` span per request (carries `request_id`)
/// 3. Request ID
/// 4. Per-group layers: rate limits, session (Google routes only), upload
///    body limit
pub fn app(state: AppState) -> Router {
    let config = state.config();
    let data_dir = &config.data_dir;
    let trust_proxy = config.trust_proxy_headers;
    let frontend = ServeDir::new(&config.frontend_dir)
        .not_found_service(ServeFile::new(config.frontend_dir.join("index.html")));

    let session_layer = middleware::create_session_layer(state.pool(), config);

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/health/ready", get(routes::health::readiness))
        .merge(routes::auth_routes().layer(middleware::auth_rate_limiter(trust_proxy)))
        .merge(routes::google_routes().layer(session_layer))
        .merge(routes::api_routes().layer(middleware::api_rate_limiter(trust_proxy)))
        .nest_service(
            &format!("/{PRODUCT_IMAGES}"),
            ServeDir::new(data_dir.join(PRODUCT_IMAGES)),
        )
        .nest_service(
            &format!("/{PROFILE_PICTURES}"),
            ServeDir::new(data_dir.join(PROFILE_PICTURES)),
        )
        .fallback_service(frontend)
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
