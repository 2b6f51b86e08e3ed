//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LIVEMART_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `LIVEMART_JWT_SECRET` - Access token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `LIVEMART_HOST` - Bind address (default: 127.0.0.1)
//! - `LIVEMART_PORT` - Listen port (default: 8000)
//! - `LIVEMART_BASE_URL` - Public URL, used for the OAuth redirect (default: <http://127.0.0.1:8000>)
//! - `LIVEMART_TOKEN_TTL_MINUTES` - Access token lifetime (default: 1440)
//! - `LIVEMART_FRONTEND_DIR` - Static HTML/JS frontend (default: `frontend`)
//! - `LIVEMART_DATA_DIR` - Uploaded images root (default: `data`)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` -
//!   outgoing mail; when `SMTP_HOST` is unset, codes are logged instead of sent
//! - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET` - Google sign-in; both or neither
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SMTP_PORT: &str = "587";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct LiveMartConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// HMAC key for access tokens
    pub jwt_secret: SecretString,
    /// Access token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Directory holding the static frontend
    pub frontend_dir: PathBuf,
    /// Directory holding `product_images/` and `profile_pictures/`
    pub data_dir: PathBuf,
    /// Key rate limits on `X-Forwarded-For` / `X-Real-IP`. Only safe behind
    /// a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    /// Outgoing mail, if configured
    pub smtp: Option<SmtpConfig>,
    /// Google sign-in, if configured
    pub google: Option<GoogleOAuthConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// SMTP relay settings.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Google OAuth client credentials.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl LiveMartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation (length, placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("LIVEMART_DATABASE_URL")?;
        let host = parse_env("LIVEMART_HOST", "127.0.0.1")?;
        let port = parse_env("LIVEMART_PORT", "8000")?;
        let base_url = get_env_or_default("LIVEMART_BASE_URL", "http://127.0.0.1:8000")
            .trim_end_matches('/')
            .to_string();
        let jwt_secret = get_validated_secret("LIVEMART_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "LIVEMART_JWT_SECRET")?;
        let token_ttl_minutes: i64 = parse_env("LIVEMART_TOKEN_TTL_MINUTES", "1440")?;
        if token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "LIVEMART_TOKEN_TTL_MINUTES".to_string(),
                "must be positive".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            jwt_secret,
            token_ttl_minutes,
            frontend_dir: get_env_or_default("LIVEMART_FRONTEND_DIR", "frontend").into(),
            data_dir: get_env_or_default("LIVEMART_DATA_DIR", "data").into(),
            trust_proxy_headers: parse_env("LIVEMART_TRUST_PROXY_HEADERS", "false")?,
            smtp: SmtpConfig::from_env()?,
            google: GoogleOAuthConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Callback URL registered with Google.
    #[must_use]
    pub fn google_redirect_uri(&self) -> String {
        format!("{}/auth/google", self.base_url)
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        let username = get_required_env("SMTP_USERNAME")?;
        Ok(Some(Self {
            host,
            port: parse_env("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            from_address: get_optional_env("EMAIL_FROM").unwrap_or_else(|| username.clone()),
            username,
            password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
        }))
    }
}

impl GoogleOAuthConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (
            get_optional_env("GOOGLE_CLIENT_ID"),
            get_optional_env("GOOGLE_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(secret)) => Ok(Some(Self {
                client_id,
                client_secret: SecretString::from(secret),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(
                "GOOGLE_CLIENT_SECRET".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar("GOOGLE_CLIENT_ID".to_string())),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Minimal configuration for unit tests elsewhere in the crate.
    pub(crate) fn test_config() -> LiveMartConfig {
        LiveMartConfig {
            database_url: SecretString::from("postgres://localhost/livemart_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            base_url: "http://127.0.0.1:8000".to_string(),
            jwt_secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
            token_ttl_minutes: 60,
            frontend_dir: PathBuf::from("frontend"),
            data_dir: PathBuf::from("data"),
            trust_proxy_headers: false,
            smtp: None,
            google: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-jwt-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"a".repeat(40), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "T").is_err());
        assert!(validate_secret_length(&SecretString::from("x".repeat(32)), "T").is_ok());
    }

    #[test]
    fn test_socket_addr_and_redirect() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
        assert_eq!(
            config.google_redirect_uri(),
            "http://127.0.0.1:8000/auth/google"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let smtp = SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: "mailer@livemart.test".to_string(),
            password: SecretString::from("hunter2-app-password"),
            from_address: "mailer@livemart.test".to_string(),
        };
        let google = GoogleOAuthConfig {
            client_id: "client-id-value".to_string(),
            client_secret: SecretString::from("google-client-secret-value"),
        };

        let smtp_debug = format!("{smtp:?}");
        let google_debug = format!("{google:?}");

        assert!(smtp_debug.contains("smtp.gmail.com"));
        assert!(!smtp_debug.contains("hunter2-app-password"));
        assert!(google_debug.contains("client-id-value"));
        assert!(!google_debug.contains("google-client-secret-value"));
        assert!(google_debug.contains("[REDACTED]"));
    }
}
