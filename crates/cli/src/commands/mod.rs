//! Subcommand implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by every command that talks to the database.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Neither database URL variable is set.
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Connecting failed.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Resolve the storefront database URL from a lookup function.
fn database_url(lookup: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
    ["STOREFRONT_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
}

/// Load `.env` and connect to the storefront database.
///
/// # Errors
///
/// Returns `CommandError` if the URL is unset or the pool cannot connect.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let url = database_url(|key| std::env::var(key).ok()).ok_or(CommandError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to storefront database...");
    Ok(uniformly_storefront::db::create_pool(&url).await?)
}
