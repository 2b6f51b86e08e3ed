//! Authentication service.
//!
//! Password signup and login for the three account roles. Access tokens are
//! issued separately by [`crate::services::token`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use live_mart_core::{Email, Role};

use crate::db::{AccountRepository, RepositoryError};
use crate::models::{
    BusinessSignup, Customer, CustomerSignup, NewBusiness, NewCustomer, Retailer, Wholesaler,
};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    accounts: AccountRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool),
        }
    }

    // =========================================================================
    // Signup
    // =========================================================================

    /// Register an unverified customer. The customer's cart is created in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailTaken` if a customer already uses the email.
    pub async fn register_customer(&self, signup: CustomerSignup) -> Result<Customer, AuthError> {
        let mail = Email::parse(&signup.mail)?;
        let name = required(&signup.name, "name")?;
        validate_password(&signup.password)?;

        let new = NewCustomer {
            name,
            mail,
            hashed_password: hash_password(&signup.password)?,
            is_verified: false,
            delivery_address: signup.delivery_address,
            city: signup.city,
            state: signup.state,
            pincode: signup.pincode,
            phone_number: signup.phone_number,
            lat: signup.lat,
            lon: signup.lon,
        };

        self.accounts
            .create_customer(&new)
            .await
            .map_err(taken_on_conflict)
    }

    /// Register an unverified retailer.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register_customer`].
    pub async fn register_retailer(&self, signup: BusinessSignup) -> Result<Retailer, AuthError> {
        let new = new_business(signup)?;
        self.accounts
            .create_retailer(&new)
            .await
            .map_err(taken_on_conflict)
    }

    /// Register an unverified wholesaler.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register_customer`].
    pub async fn register_wholesaler(
        &self,
        signup: BusinessSignup,
    ) -> Result<Wholesaler, AuthError> {
        let new = new_business(signup)?;
        self.accounts
            .create_wholesaler(&new)
            .await
            .map_err(taken_on_conflict)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Check a role's credentials and return the account email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown for
    /// this role or the password is wrong.
    /// Returns `AuthError::NotVerified` if the account's email has not been
    /// verified yet. This is checked before the password.
    pub async fn login(&self, role: Role, mail: &str, password: &str) -> Result<Email, AuthError> {
        let email = Email::parse(mail).map_err(|_| AuthError::InvalidCredentials)?;

        let creds = self
            .accounts
            .credentials(role, &email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !creds.is_verified {
            return Err(AuthError::NotVerified);
        }

        verify_password(password, &creds.hashed_password)?;

        Ok(creds.mail)
    }
}

fn new_business(signup: BusinessSignup) -> Result<NewBusiness, AuthError> {
    let mail = Email::parse(&signup.mail)?;
    validate_password(&signup.password)?;

    Ok(NewBusiness {
        name: required(&signup.name, "name")?,
        business_name: required(&signup.business_name, "business_name")?,
        address: required(&signup.address, "address")?,
        city: required(&signup.city, "city")?,
        state: required(&signup.state, "state")?,
        pincode: required(&signup.pincode, "pincode")?,
        hashed_password: hash_password(&signup.password)?,
        mail,
        is_verified: false,
        phone_number: signup.phone_number,
        tax_id: signup.tax_id,
        lat: signup.lat,
        lon: signup.lon,
    })
}

fn required(value: &str, field: &'static str) -> Result<String, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(trimmed.to_owned())
}

fn taken_on_conflict(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::Conflict(_) => AuthError::EmailTaken,
        other => AuthError::Repository(other),
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unparsable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Hash of a random password nobody knows, for accounts created through
/// social login.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn unusable_password_hash() -> Result<String, AuthError> {
    hash_password(&uuid::Uuid::new_v4().to_string())
}
