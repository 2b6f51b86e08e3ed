//! Signup, login, and `me` handlers for all three roles.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use live_mart_core::{Email, Role};

use crate::error::{AppError, Result};
use crate::middleware::{CurrentCustomer, CurrentRetailer, CurrentWholesaler};
use crate::models::{
    BusinessSignup, Customer, CustomerSignup, LoginRequest, Retailer, TokenResponse, Wholesaler,
};
use crate::services::auth::AuthService;
use crate::services::otp::{OtpPurpose, OtpService};
use crate::state::AppState;

/// Store a verification code and mail it without holding up the response.
///
/// # Errors
///
/// Returns `AppError::Database` if the code cannot be stored. Delivery
/// failures are only logged.
pub(crate) async fn send_verification(state: &AppState, email: &Email) -> Result<()> {
    let code = OtpService::new(state.pool())
        .issue(email, OtpPurpose::Verification)
        .await?;

    let state = state.clone();
    let to = email.to_string();
    tokio::spawn(async move {
        if let Err(e) = state.email().send_verification_code(&to, &code).await {
            tracing::warn!(error = %e, email = %to, "failed to send verification email");
        }
    });
    Ok(())
}

/// `POST /signup/customer`
#[instrument(skip_all, fields(mail = %signup.mail))]
pub async fn signup_customer(
    State(state): State<AppState>,
    Json(signup): Json<CustomerSignup>,
) -> Result<(StatusCode, Json<Customer>)> {
    let customer = AuthService::new(state.pool()).register_customer(signup).await?;
    send_verification(&state, &customer.mail).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// `POST /signup/retailer`
#[instrument(skip_all, fields(mail = %signup.mail))]
pub async fn signup_retailer(
    State(state): State<AppState>,
    Json(signup): Json<BusinessSignup>,
) -> Result<(StatusCode, Json<Retailer>)> {
    let retailer = AuthService::new(state.pool()).register_retailer(signup).await?;
    send_verification(&state, &retailer.mail).await?;
    Ok((StatusCode::CREATED, Json(retailer)))
}

/// `POST /signup/wholesaler`
#[instrument(skip_all, fields(mail = %signup.mail))]
pub async fn signup_wholesaler(
    State(state): State<AppState>,
    Json(signup): Json<BusinessSignup>,
) -> Result<(StatusCode, Json<Wholesaler>)> {
    let wholesaler = AuthService::new(state.pool())
        .register_wholesaler(signup)
        .await?;
    send_verification(&state, &wholesaler.mail).await?;
    Ok((StatusCode::CREATED, Json(wholesaler)))
}

/// `POST /login/{role}`
#[instrument(skip_all, fields(mail = %request.mail))]
pub async fn login(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let role: Role = role
        .parse()
        .map_err(|_| AppError::NotFound("Not Found".to_string()))?;

    let email = AuthService::new(state.pool())
        .login(role, &request.mail, &request.password)
        .await?;

    let token = state
        .tokens()
        .issue(&email, role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(role = %role, "login succeeded");
    Ok(Json(TokenResponse::bearer(token)))
}

/// `GET /customer/me`
pub async fn customer_me(CurrentCustomer(customer): CurrentCustomer) -> Json<Customer> {
    Json(customer)
}

/// `GET /retailer/me`
pub async fn retailer_me(CurrentRetailer(retailer): CurrentRetailer) -> Json<Retailer> {
    Json(retailer)
}

/// `GET /wholesaler/me`
pub async fn wholesaler_me(CurrentWholesaler(wholesaler): CurrentWholesaler) -> Json<Wholesaler> {
    Json(wholesaler)
}
