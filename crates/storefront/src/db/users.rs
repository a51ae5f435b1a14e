//! User repository for database operations.

use sqlx::PgPool;

use uniformly_core::{Email, OrderStatus, UserId};

use super::{Page, RepositoryError, classify};
use crate::models::User;

const USER_COLUMNS: &str = "id, email, full_name, created_at";
const EMAIL_TAKEN: &str = "email already exists";

/// What a user deletion removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeletedUser {
    pub cart_items: u64,
    pub orders: u64,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: Page) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, full_name) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(full_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify(e, EMAIL_TAKEN))
    }

    /// Apply an allow-listed update. `full_name` of `Some(None)` clears it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID and
    /// `RepositoryError::Conflict` if the new email belongs to someone else.
    pub async fn update(
        &self,
        id: UserId,
        email: Option<&Email>,
        full_name: Option<Option<&str>>,
    ) -> Result<User, RepositoryError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE users SET
                email = COALESCE($2, email),
                full_name = CASE WHEN $3 THEN $4 ELSE full_name END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(email)
        .bind(full_name.is_some())
        .bind(full_name.flatten())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify(e, EMAIL_TAKEN))?;

        updated.ok_or(RepositoryError::NotFound)
    }

    /// Delete a user together with their cart and closed orders.
    ///
    /// Runs in one transaction. The user row is locked first so no order can
    /// be placed for them while the check runs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID and
    /// `RepositoryError::Conflict` while the user has open orders.
    pub async fn delete(&self, id: UserId) -> Result<DeletedUser, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<UserId> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let open: Vec<&str> = OrderStatus::ALL
            .into_iter()
            .filter(|status| status.is_open())
            .map(OrderStatus::as_str)
            .collect();
        let open_orders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND status::text = ANY($2)",
        )
        .bind(id)
        .bind(&open)
        .fetch_one(&mut *tx)
        .await?;
        if open_orders > 0 {
            return Err(RepositoryError::Conflict(format!(
                "user has {open_orders} open order(s)"
            )));
        }

        let cart_items = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let orders = sqlx::query("DELETE FROM orders WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DeletedUser { cart_items, orders })
    }
}
