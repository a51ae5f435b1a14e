//! Resolving the current customer.
//!
//! There are no credentials: logging in is a lookup by email. The lookup sits
//! behind [`IdentityResolver`] so a real identity provider can replace it.

use async_trait::async_trait;
use sqlx::PgPool;

use uniformly_core::Email;

use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// Resolves a customer from an identifying email.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Find the user for this email, if one is registered.
    async fn resolve(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
}

/// Looks users up in the `users` table.
#[derive(Clone)]
pub struct EmailLookup {
    pool: PgPool,
}

impl EmailLookup {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for EmailLookup {
    async fn resolve(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_email(email).await
    }
}
