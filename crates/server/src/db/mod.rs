//! Database operations for Live MART `PostgreSQL`.
//!
//! ## Tables
//!
//! - `customers`, `retailers`, `wholesalers` - one table per account role
//! - `otp_codes` - verification and password-reset codes
//! - `categories`, `products`, `feedback`
//! - `carts`, `cart_items`
//! - `orders`, `order_items` - customer purchases
//! - `wholesale_orders`, `wholesale_order_items` - retailer restocking
//! - `tower_sessions.session` - OAuth handshake sessions
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p live-mart-cli -- migrate
//! ```

pub mod accounts;
pub mod carts;
pub mod categories;
pub mod feedback;
pub mod orders;
pub mod otp;
pub mod products;
pub mod wholesale;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::AccountRepository;
pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use feedback::FeedbackRepository;
pub use orders::OrderRepository;
pub use otp::OtpRepository;
pub use products::ProductRepository;
pub use wholesale::WholesaleRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, referenced product).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
pub(crate) fn map_constraint(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
