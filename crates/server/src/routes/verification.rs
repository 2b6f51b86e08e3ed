//! Email verification and password reset via one-time codes.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use live_mart_core::{Email, Role};

use crate::db::AccountRepository;
use crate::error::{AppError, Result};
use crate::routes::auth::send_verification;
use crate::services::auth::{hash_password, validate_password};
use crate::services::otp::{OtpCheck, OtpPurpose, OtpService, StoredOtp};
use crate::state::AppState;

const EXPIRED: &str = "OTP has expired.";

#[derive(Debug, Deserialize)]
pub struct VerifyAccountRequest {
    pub email: String,
    pub otp: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifiedResponse {
    pub message: &'static str,
    pub access_token: String,
    pub token_type: &'static str,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|_| AppError::BadRequest("Invalid email address".to_string()))
}

/// Explicit role from the request; blank means "look it up".
fn requested_role(raw: Option<&str>) -> Result<Option<Role>> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(None),
        Some(r) => r
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Unknown role: {r}"))),
    }
}

/// Require a valid password-reset code, mapping the failures to their
/// client messages.
async fn valid_reset_code(
    otps: &OtpService<'_>,
    email: &Email,
    code: &str,
    invalid: &str,
) -> Result<StoredOtp> {
    match otps.check(email, OtpPurpose::PasswordReset, code).await? {
        OtpCheck::Valid(stored) => Ok(stored),
        OtpCheck::Invalid => Err(AppError::BadRequest(invalid.to_string())),
        OtpCheck::Expired => Err(AppError::BadRequest(EXPIRED.to_string())),
    }
}

/// `POST /auth/verify-account`
#[instrument(skip_all, fields(email = %request.email))]
pub async fn verify_account(
    State(state): State<AppState>,
    Json(request): Json<VerifyAccountRequest>,
) -> Result<Json<VerifiedResponse>> {
    let invalid = || AppError::BadRequest("Invalid or Expired OTP".to_string());

    let email = Email::parse(&request.email).map_err(|_| invalid())?;
    let otps = OtpService::new(state.pool());
    let OtpCheck::Valid(stored) = otps
        .check(&email, OtpPurpose::Verification, &request.otp)
        .await?
    else {
        return Err(invalid());
    };

    let accounts = AccountRepository::new(state.pool());
    let role = match requested_role(request.role.as_deref())? {
        Some(role) => role,
        None => accounts
            .find_role(&email)
            .await?
            .map(|(role, _)| role)
            .ok_or_else(|| AppError::NotFound("User verified but role not found.".to_string()))?,
    };

    if !accounts.mark_verified(role, &email).await? {
        return Err(AppError::NotFound(
            "User verified but role not found.".to_string(),
        ));
    }
    otps.consume(&stored).await?;

    let access_token = state
        .tokens()
        .issue(&email, role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(role = %role, "account verified");
    Ok(Json(VerifiedResponse {
        message: "Verified",
        access_token,
        token_type: "bearer",
        role,
    }))
}

/// `POST /auth/resend-verification?email=`
#[instrument(skip_all, fields(email = %query.email))]
pub async fn resend_verification(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Value>> {
    let email = parse_email(&query.email)?;
    let (_, credentials) = AccountRepository::new(state.pool())
        .find_role(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if credentials.is_verified {
        return Ok(Json(json!({ "message": "Account already verified" })));
    }

    send_verification(&state, &email).await?;
    Ok(Json(json!({ "message": "Verification OTP Resent." })))
}

/// `POST /auth/forgot-password`
#[instrument(skip_all, fields(email = %request.email))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    let email = parse_email(&request.email)?;
    if AccountRepository::new(state.pool())
        .find_role(&email)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(
            "User with this mail does not exist".to_string(),
        ));
    }

    let code = OtpService::new(state.pool())
        .issue(&email, OtpPurpose::PasswordReset)
        .await?;

    let to = email.to_string();
    let mail_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = mail_state.email().send_password_reset(&to, &code).await {
            tracing::warn!(error = %e, email = %to, "failed to send password reset email");
        }
    });

    Ok(Json(json!({ "message": "OTP sent to your email." })))
}

/// `POST /auth/verify-otp-only`
///
/// Lets the frontend confirm a reset code before asking for the new
/// password. The code stays valid for `reset-password`.
#[instrument(skip_all, fields(email = %request.email))]
pub async fn verify_otp_only(
    State(state): State<AppState>,
    Json(request): Json<OtpRequest>,
) -> Result<Json<Value>> {
    let email = parse_email(&request.email)?;
    let otps = OtpService::new(state.pool());
    valid_reset_code(&otps, &email, &request.otp, "Invalid OTP Code.").await?;
    Ok(Json(json!({ "message": "OTP is valid." })))
}

/// `POST /auth/reset-password`
#[instrument(skip_all, fields(email = %request.email))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    let email = parse_email(&request.email)?;
    let otps = OtpService::new(state.pool());
    let stored = valid_reset_code(&otps, &email, &request.otp, "Invalid OTP.").await?;

    validate_password(&request.new_password)?;
    let hashed = hash_password(&request.new_password)?;

    let updated = AccountRepository::new(state.pool())
        .update_password_everywhere(&email, &hashed)
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound("User account not found.".to_string()));
    }
    otps.consume(&stored).await?;

    tracing::info!(accounts = updated, "password reset");
    Ok(Json(json!({
        "message": "Password updated successfully. You can now login."
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_role() {
        assert_eq!(requested_role(None).unwrap(), None);
        assert_eq!(requested_role(Some("  ")).unwrap(), None);
        assert_eq!(
            requested_role(Some("Retailer")).unwrap(),
            Some(Role::Retailer)
        );
        assert!(requested_role(Some("admin")).is_err());
    }
}
