//! Bearer-token extractors.
//!
//! Each extractor reads `Authorization: Bearer <token>`, checks that the
//! token was issued for its role, and loads the account. Any failure
//! rejects with 401 "Could not validate credentials".
//!
//! # Example
//!
//! ```rust,ignore
//! async fn my_products(
//!     State(state): State<AppState>,
//!     CurrentRetailer(retailer): CurrentRetailer,
//! ) -> Result<Json<Vec<Product>>> {
//!     // ...
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use live_mart_core::{Email, Role};

use crate::db::AccountRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{Customer, Retailer, Wholesaler};
use crate::state::AppState;

const CREDENTIALS_ERROR: &str = "Could not validate credentials";

fn unauthorized() -> AppError {
    AppError::Unauthorized(CREDENTIALS_ERROR.to_string())
}

/// The token from an `Authorization: Bearer` header, if any.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Verify the bearer token and require it to carry `role`.
fn authenticated_email(parts: &Parts, state: &AppState, role: Role) -> Result<Email, AppError> {
    let token = bearer_token(parts).ok_or_else(unauthorized)?;

    let claims = state.tokens().verify(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        unauthorized()
    })?;

    if claims.role != role {
        return Err(unauthorized());
    }

    Email::parse(&claims.sub).map_err(|_| unauthorized())
}

/// The authenticated customer.
pub struct CurrentCustomer(pub Customer);

/// The authenticated retailer.
pub struct CurrentRetailer(pub Retailer);

/// The authenticated wholesaler.
pub struct CurrentWholesaler(pub Wholesaler);

impl FromRequestParts<AppState> for CurrentCustomer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let email = authenticated_email(parts, state, Role::Customer)?;
        let customer = AccountRepository::new(state.pool())
            .customer_by_email(&email)
            .await?
            .ok_or_else(unauthorized)?;

        set_sentry_user(&customer.id, Some(customer.mail.as_str()));
        Ok(Self(customer))
    }
}

impl FromRequestParts<AppState> for CurrentRetailer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let email = authenticated_email(parts, state, Role::Retailer)?;
        let retailer = AccountRepository::new(state.pool())
            .retailer_by_email(&email)
            .await?
            .ok_or_else(unauthorized)?;

        set_sentry_user(&retailer.id, Some(retailer.mail.as_str()));
        Ok(Self(retailer))
    }
}

impl FromRequestParts<AppState> for CurrentWholesaler {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let email = authenticated_email(parts, state, Role::Wholesaler)?;
        let wholesaler = AccountRepository::new(state.pool())
            .wholesaler_by_email(&email)
            .await?
            .ok_or_else(unauthorized)?;

        set_sentry_user(&wholesaler.id, Some(wholesaler.mail.as_str()));
        Ok(Self(wholesaler))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/customer/me");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts_with(Some("bearer  xyz "))), Some("xyz"));
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
