//! Google sign-in (OAuth 2.0 authorization-code flow).
//!
//! # Flow
//!
//! 1. `GET /login/google` stores a random state in the session and redirects
//!    to [`GoogleClient::authorization_url`]
//! 2. Google redirects back to `/auth/google` with `code` and `state`
//! 3. The code is exchanged for an access token, which fetches the profile
//! 4. [`sign_in`] maps the email onto an account and role

use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use url::Url;

use live_mart_core::{Email, Role};

use crate::config::GoogleOAuthConfig;
use crate::db::{AccountRepository, RepositoryError};
use crate::models::NewCustomer;
use crate::services::auth::{AuthError, unusable_password_hash};

const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Errors from the Google sign-in flow.
#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("invalid email from provider: {0}")]
    Email(#[from] live_mart_core::EmailError),

    #[error("account error: {0}")]
    Auth(#[from] AuthError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Profile fields returned by the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Client for Google's OAuth endpoints.
#[derive(Clone)]
pub struct GoogleClient {
    inner: Arc<GoogleClientInner>,
}

struct GoogleClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl GoogleClient {
    #[must_use]
    pub fn new(config: &GoogleOAuthConfig, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(GoogleClientInner {
                client,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.expose_secret().to_string(),
            }),
        }
    }

    /// URL of Google's consent page.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        let params = [
            ("client_id", self.inner.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state),
            ("prompt", "select_account"),
        ];
        Url::parse_with_params(AUTHORIZE_ENDPOINT, &params)
            .map_or_else(|_| AUTHORIZE_ENDPOINT.to_string(), String::from)
    }

    /// Exchange an authorization code for the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `GoogleError::OAuth` if either request is rejected, or
    /// `GoogleError::Http` on transport and decoding failures.
    pub async fn fetch_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleProfile, GoogleError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GoogleError::OAuth(format!("Token exchange failed: {text}")));
        }

        let token: TokenResponse = response.json().await?;

        let response = self
            .inner
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GoogleError::OAuth(format!("Userinfo request failed ({status})")));
        }

        Ok(response.json().await?)
    }
}

/// Random value for the OAuth `state` parameter.
#[must_use]
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Map a Google profile onto a local account.
///
/// An existing retailer wins, then an existing wholesaler. Anyone else
/// signs in as a customer, created on first use. Google has verified the
/// address, so the resolved account is marked verified.
///
/// # Errors
///
/// Returns `GoogleError::Email` for an unusable address and
/// `GoogleError::Repository` for database failures.
#[tracing::instrument(skip(pool, profile), fields(email = %profile.email))]
pub async fn sign_in(pool: &PgPool, profile: &GoogleProfile) -> Result<(Email, Role), GoogleError> {
    let email = Email::parse(&profile.email)?;
    let accounts = AccountRepository::new(pool);

    if accounts.retailer_by_email(&email).await?.is_some() {
        accounts.mark_verified(Role::Retailer, &email).await?;
        return Ok((email, Role::Retailer));
    }

    if accounts.wholesaler_by_email(&email).await?.is_some() {
        accounts.mark_verified(Role::Wholesaler, &email).await?;
        return Ok((email, Role::Wholesaler));
    }

    if accounts.customer_by_email(&email).await?.is_none() {
        let name = profile
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.local_part())
            .to_owned();

        let new = NewCustomer {
            name,
            mail: email.clone(),
            hashed_password: unusable_password_hash()?,
            is_verified: true,
            delivery_address: None,
            city: None,
            state: None,
            pincode: None,
            phone_number: None,
            lat: None,
            lon: None,
        };
        match accounts.create_customer(&new).await {
            Ok(customer) => tracing::info!(customer_id = %customer.id, "created customer from Google sign-in"),
            // Lost a race with a concurrent first sign-in; the account exists now
            Err(RepositoryError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    accounts.mark_verified(Role::Customer, &email).await?;
    Ok((email, Role::Customer))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client() -> GoogleClient {
        GoogleClient::new(
            &GoogleOAuthConfig {
                client_id: "client-123.apps.googleusercontent.com".to_string(),
                client_secret: SecretString::from("shh"),
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_authorization_url_carries_parameters() {
        let url = client().authorization_url("http://127.0.0.1:8000/auth/google", "xyz");
        let parsed = Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with(AUTHORIZE_ENDPOINT));
        assert_eq!(params["client_id"], "client-123.apps.googleusercontent.com");
        assert_eq!(params["redirect_uri"], "http://127.0.0.1:8000/auth/google");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "openid email profile");
        assert_eq!(params["state"], "xyz");
    }

    #[test]
    fn test_generate_state() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
