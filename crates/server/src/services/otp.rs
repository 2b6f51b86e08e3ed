//! One-time codes for email verification and password reset.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::PgPool;

use live_mart_core::Email;

use crate::db::{OtpRepository, RepositoryError};

/// How long an issued code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// What a code may be used for. Codes for one purpose never satisfy another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    Verification,
    PasswordReset,
}

impl OtpPurpose {
    /// Value stored in `otp_codes.purpose`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// A code as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredOtp {
    pub id: i32,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredOtp {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of checking a submitted code.
#[derive(Debug)]
pub enum OtpCheck {
    Valid(StoredOtp),
    /// No stored code matches.
    Invalid,
    /// A matching code existed but had expired; it has been deleted.
    Expired,
}

/// Generate a 6-digit code.
#[must_use]
pub fn generate_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// Expiry for a code issued at `now`.
#[must_use]
pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(OTP_TTL_MINUTES)
}

/// Issues and checks one-time codes.
pub struct OtpService<'a> {
    codes: OtpRepository<'a>,
}

impl<'a> OtpService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            codes: OtpRepository::new(pool),
        }
    }

    /// Store a fresh code for `email`, replacing any earlier code for the
    /// same purpose, and return it for delivery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the code cannot be stored.
    pub async fn issue(&self, email: &Email, purpose: OtpPurpose) -> Result<String, RepositoryError> {
        let code = generate_code();
        self.codes
            .replace(email, purpose, &code, expiry_from(Utc::now()))
            .await?;
        tracing::debug!(email = %email, purpose = purpose.as_str(), "issued one-time code");
        Ok(code)
    }

    /// Check a submitted code without consuming it. Expired matches are
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn check(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<OtpCheck, RepositoryError> {
        let Some(stored) = self.codes.find(email, purpose, code.trim()).await? else {
            return Ok(OtpCheck::Invalid);
        };

        if stored.is_expired_at(Utc::now()) {
            self.codes.delete(stored.id).await?;
            return Ok(OtpCheck::Expired);
        }

        Ok(OtpCheck::Valid(stored))
    }

    /// Delete a code after successful use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn consume(&self, otp: &StoredOtp) -> Result<(), RepositoryError> {
        self.codes.delete(otp.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_format() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..1_000_000).contains(&value));
        }
    }

    #[test]
    fn test_expiry_window() {
        let issued = Utc::now();
        let otp = StoredOtp {
            id: 1,
            code: "123456".to_string(),
            expires_at: expiry_from(issued),
        };

        assert!(!otp.is_expired_at(issued));
        assert!(!otp.is_expired_at(issued + Duration::minutes(9)));
        assert!(otp.is_expired_at(issued + Duration::minutes(OTP_TTL_MINUTES)));
        assert!(otp.is_expired_at(issued + Duration::hours(1)));
    }

    #[test]
    fn test_purpose_values_match_check_constraint() {
        assert_eq!(OtpPurpose::Verification.as_str(), "verification");
        assert_eq!(OtpPurpose::PasswordReset.as_str(), "password_reset");
    }
}
