//! Cart repository.
//!
//! A user holds at most one row per product. Adding a product that is
//! already in the cart increments the existing row in a single
//! `INSERT ... ON CONFLICT DO UPDATE`, so concurrent adds never lose an
//! increment.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use uniformly_core::{CartItemId, Price, ProductId, SchoolId, UserId};

use super::{RepositoryError, classify};
use crate::models::{CartItem, CartItemView, CartProduct};

const CART_ITEM_COLUMNS: &str = "id, user_id, product_id, quantity, created_at";

/// Whether an add created a new row or merged into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
}

#[derive(sqlx::FromRow)]
struct MergedRow {
    #[sqlx(flatten)]
    item: CartItem,
    inserted: bool,
}

#[derive(sqlx::FromRow)]
struct CartViewRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
    school_id: SchoolId,
    product_name: String,
    price_cents: Price,
    image_url: Option<String>,
}

impl From<CartViewRow> for CartItemView {
    fn from(row: CartViewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
            product: CartProduct {
                id: row.product_id,
                school_id: row.school_id,
                name: row.product_name,
                price_cents: row.price_cents,
                image_url: row.image_url,
            },
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart with product details, oldest line first.
    ///
    /// An empty or unknown user's cart is an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartItemView>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartViewRow>(
            r"
            SELECT ci.id, ci.user_id, ci.product_id, ci.quantity, ci.created_at,
                   p.school_id, p.name AS product_name, p.price_cents, p.image_url
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItemView::from).collect())
    }

    /// Add `quantity` of a product, merging into an existing line.
    ///
    /// On merge the quantity is incremented and the timestamp refreshed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or product does not
    /// exist, `RepositoryError::OutOfRange` if the merged quantity does not
    /// fit, `RepositoryError::Database` for other failures.
    pub async fn add_or_merge(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(CartItem, MergeOutcome), RepositoryError> {
        let row = sqlx::query_as::<_, MergedRow>(&format!(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET
                quantity = cart_items.quantity + EXCLUDED.quantity,
                created_at = now()
            RETURNING {CART_ITEM_COLUMNS}, (xmax = 0) AS inserted
            "
        ))
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify(e, "cart line already exists"))?;

        let outcome = if row.inserted {
            MergeOutcome::Created
        } else {
            MergeOutcome::Updated
        };
        Ok((row.item, outcome))
    }

    /// Replace a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no line has this ID.
    pub async fn set_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(&format!(
            r"
            UPDATE cart_items SET quantity = $2, created_at = now()
            WHERE id = $1
            RETURNING {CART_ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        item.ok_or(RepositoryError::NotFound)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no line has this ID.
    pub async fn remove(&self, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line in a user's cart. Succeeds on an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
