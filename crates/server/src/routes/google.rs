//! Google sign-in route handlers.
//!
//! - `GET /login/google`: store a CSRF state in the session, redirect to Google
//! - `GET /auth/google`: validate the state, resolve the account, redirect
//!   to the role's landing page with `?token=<jwt>`

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::services::google::{self, GoogleClient};
use crate::state::AppState;

const LOGIN_FAILED: &str = "Google Login Failed";

/// Query parameters from Google's redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn configured(state: &AppState) -> Result<&GoogleClient> {
    state
        .google()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_string()))
}

fn login_failed(reason: &str) -> AppError {
    tracing::warn!(reason, "Google sign-in failed");
    AppError::BadRequest(LOGIN_FAILED.to_string())
}

/// `GET /login/google`
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let client = configured(&state)?;
    let oauth_state = google::generate_state();

    session
        .insert(session_keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let url = client.authorization_url(&state.config().google_redirect_uri(), &oauth_state);
    Ok(Redirect::to(&url))
}

/// `GET /auth/google`
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    let client = configured(&state)?;

    if let Some(error) = query.error {
        return Err(login_failed(&format!("provider returned {error}")));
    }
    let code = query.code.ok_or_else(|| login_failed("missing code"))?;
    let returned_state = query.state.ok_or_else(|| login_failed("missing state"))?;

    // One-time use, even when it does not match
    let stored_state: Option<String> = session
        .remove(session_keys::GOOGLE_OAUTH_STATE)
        .await
        .ok()
        .flatten();
    if stored_state.as_deref() != Some(returned_state.as_str()) {
        return Err(login_failed("state mismatch"));
    }

    let profile = client
        .fetch_profile(&code, &state.config().google_redirect_uri())
        .await
        .map_err(|e| login_failed(&e.to_string()))?;

    let (email, role) = google::sign_in(state.pool(), &profile)
        .await
        .map_err(|e| login_failed(&e.to_string()))?;

    let token = state
        .tokens()
        .issue(&email, role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(role = %role, "Google sign-in succeeded");
    Ok(Redirect::to(&format!(
        "/{}?token={token}",
        role.landing_page()
    )))
}
