//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `schools` - School directory
//! - `users` - Customer accounts (lowercased unique email)
//! - `products` - Catalog products (catalog API is disabled, rows are join targets)
//! - `cart_items` - One row per (user, product) with a merged quantity
//! - `orders` / `order_items` - Frozen snapshots written by checkout
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p uniformly-cli -- migrate
//! ```

pub mod cart;
pub mod orders;
pub mod schools;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::{CartRepository, MergeOutcome};
pub use orders::OrderRepository;
pub use schools::SchoolRepository;
pub use users::UserRepository;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 10;
/// Largest page a client may request.
pub const MAX_LIMIT: i64 = 100;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A computed value does not fit its column.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Page window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Clamp `limit` to `[1, 100]` (default 10) and `offset` to `>= 0` (default 0).
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// SQLSTATE for arithmetic that overflows a column type.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Map a unique violation to `Conflict`, a foreign-key violation to
/// `NotFound`, and an overflow to `OutOfRange`.
pub(crate) fn classify(err: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
        if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
            return RepositoryError::OutOfRange(db_err.message().to_owned());
        }
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        assert_eq!(Page::default(), Page { limit: 10, offset: 0 });
    }

    #[test]
    fn test_page_clamps() {
        assert_eq!(Page::new(Some(500), Some(-3)), Page { limit: 100, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(20)), Page { limit: 1, offset: 20 });
        assert_eq!(Page::new(Some(-7), None).limit, 1);
    }
}
