//! Seed the storefront database with directory and demo data.
//!
//! Seeding is idempotent: rows that already exist are skipped, so the
//! commands can be re-run against a live database.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use uniformly_core::Email;
use uniformly_storefront::db::{RepositoryError, SchoolRepository, UserRepository};
use uniformly_storefront::models::NewSchool;

use super::{CommandError, connect};

/// Built-in school directory as `(name, city)`.
pub const SCHOOLS: &[(&str, &str)] = &[
    ("Allied School", "Lahore, PK"),
    ("Bahria Foundation", "Islamabad, PK"),
    ("Fauji Foundation", "Rawalpindi, PK"),
    ("The Educators", "Lahore, PK"),
    ("Peace School and College", "Peshawar, PK"),
    ("Rahmia Islamic Model School", "Karachi, PK"),
];

/// Demo customer accounts as `(email, full name)`.
pub const USERS: &[(&str, &str)] = &[
    ("parent1@example.com", "Sarah Johnson"),
    ("parent2@example.com", "Michael Chen"),
];

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid seed email {0}")]
    InvalidEmail(&'static str),
}

/// Rows written and rows left alone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Insert the built-in schools.
///
/// # Errors
///
/// Returns `SeedError` if the connection or an insert fails.
pub async fn schools() -> Result<(), SeedError> {
    let pool = connect().await?;
    let summary = seed_schools(&pool).await?;

    info!("Schools seeded!");
    info!("  Inserted: {}", summary.inserted);
    info!("  Skipped (already exist): {}", summary.skipped);
    Ok(())
}

/// Insert the demo users.
///
/// # Errors
///
/// Returns `SeedError` if the connection or an insert fails.
pub async fn users() -> Result<(), SeedError> {
    let pool = connect().await?;
    let summary = seed_users(&pool).await?;

    info!("Users seeded!");
    info!("  Inserted: {}", summary.inserted);
    info!("  Skipped (already exist): {}", summary.skipped);
    Ok(())
}

/// With `clear`, delete every product that no order item refers to.
///
/// The catalog API is disabled, so there is nothing to insert.
///
/// # Errors
///
/// Returns `SeedError` if the connection or the delete fails.
pub async fn products(clear: bool) -> Result<(), SeedError> {
    if !clear {
        warn!("The product catalog is disabled; pass --clear to remove unreferenced products");
        return Ok(());
    }

    let pool = connect().await?;
    let removed = clear_products(&pool).await?;

    info!(removed, "Unreferenced products cleared");
    Ok(())
}

/// Insert each school in [`SCHOOLS`] unless one with the same name and city exists.
///
/// # Errors
///
/// Returns `SeedError::Repository` if a query fails.
pub async fn seed_schools(pool: &PgPool) -> Result<SeedSummary, SeedError> {
    let repo = SchoolRepository::new(pool);
    let mut summary = SeedSummary::default();

    for &(name, city) in SCHOOLS {
        if repo.exists(name, city).await? {
            summary.skipped += 1;
            continue;
        }

        let school = NewSchool {
            name: Some(name.to_owned()),
            city: Some(city.to_owned()),
            ..NewSchool::default()
        };
        let created = repo.create(&school).await?;
        info!(id = %created.id, name, city, "Inserted school");
        summary.inserted += 1;
    }

    Ok(summary)
}

/// Insert each user in [`USERS`] unless the email is taken.
///
/// # Errors
///
/// Returns `SeedError` if an email is malformed or a query fails.
pub async fn seed_users(pool: &PgPool) -> Result<SeedSummary, SeedError> {
    let repo = UserRepository::new(pool);
    let mut summary = SeedSummary::default();

    for &(raw, full_name) in USERS {
        let email = Email::parse(raw).map_err(|_| SeedError::InvalidEmail(raw))?;
        if repo.get_by_email(&email).await?.is_some() {
            summary.skipped += 1;
            continue;
        }

        let created = repo.create(&email, Some(full_name)).await?;
        info!(id = %created.id, email = %email, "Inserted user");
        summary.inserted += 1;
    }

    Ok(summary)
}

/// Delete products that no order item refers to. Cart lines pointing at
/// them cascade.
///
/// # Errors
///
/// Returns `SeedError::Database` if the delete fails.
pub async fn clear_products(pool: &PgPool) -> Result<u64, SeedError> {
    let result = sqlx::query(
        r"
        DELETE FROM products p
        WHERE NOT EXISTS (SELECT 1 FROM order_items oi WHERE oi.product_id = p.id)
        ",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
