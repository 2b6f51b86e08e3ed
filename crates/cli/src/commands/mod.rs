//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the database commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Seeding refused or failed.
    #[error("Seed error: {0}")]
    Seed(String),
}

/// Connect using `LIVEMART_DATABASE_URL`, falling back to `DATABASE_URL`,
/// the same variables the server reads.
///
/// # Errors
///
/// Returns `CommandError::MissingEnvVar` if neither variable is set, or
/// `CommandError::Database` if the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("LIVEMART_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("LIVEMART_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(live_mart_server::db::create_pool(&database_url).await?)
}
