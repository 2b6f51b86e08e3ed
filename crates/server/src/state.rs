//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::LiveMartConfig;
use crate::services::catalog::CategoryCache;
use crate::services::email::EmailService;
use crate::services::google::GoogleClient;
use crate::services::token::TokenService;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("SMTP configuration error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: LiveMartConfig,
    pool: PgPool,
    tokens: TokenService,
    email: EmailService,
    google: Option<GoogleClient>,
    categories: CategoryCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay or HTTP client cannot be built.
    pub fn new(config: LiveMartConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(config.jwt_secret.clone(), config.token_ttl_minutes);
        let email = EmailService::new(config.smtp.as_ref())?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("live-mart/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        let google = config
            .google
            .as_ref()
            .map(|google| GoogleClient::new(google, http));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                email,
                google,
                categories: CategoryCache::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &LiveMartConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Google sign-in client; `None` when not configured.
    #[must_use]
    pub fn google(&self) -> Option<&GoogleClient> {
        self.inner.google.as_ref()
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryCache {
        &self.inner.categories
    }
}
