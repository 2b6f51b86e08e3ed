//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store, OAuth routes only)
//! 5. Rate limiting (governor)
//!
//! Authentication is not a layer: handlers take a [`CurrentCustomer`],
//! [`CurrentRetailer`], or [`CurrentWholesaler`] extractor.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{CurrentCustomer, CurrentRetailer, CurrentWholesaler};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
