//! Session middleware configuration.
//!
//! Sessions only carry the Google OAuth `state` between the redirect and the
//! callback; API authentication uses bearer tokens.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::LiveMartConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "lm_session";

/// Session expiry time in seconds (15 minutes, long enough to finish sign-in).
const SESSION_EXPIRY_SECONDS: i64 = 15 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by migration.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &LiveMartConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
