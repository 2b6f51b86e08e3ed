//! One-time code storage.
//!
//! At most one live code exists per (email, purpose); issuing a new code
//! replaces the previous one.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use live_mart_core::Email;

use super::RepositoryError;
use crate::services::otp::{OtpPurpose, StoredOtp};

/// Repository for OTP codes.
pub struct OtpRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OtpRepository<'a> {
    /// Create a new OTP repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Delete any existing code for this email and purpose, then store `code`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn replace(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM otp_codes WHERE email = $1 AND purpose = $2")
            .bind(email)
            .bind(purpose.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO otp_codes (email, code, purpose, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(email)
        .bind(code)
        .bind(purpose.as_str())
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Find the newest stored code matching `code` exactly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<Option<StoredOtp>, RepositoryError> {
        let row = sqlx::query_as::<_, StoredOtp>(
            r"
            SELECT id, code, expires_at
            FROM otp_codes
            WHERE email = $1 AND purpose = $2 AND code = $3
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(email)
        .bind(purpose.as_str())
        .bind(code)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a stored code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM otp_codes WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
