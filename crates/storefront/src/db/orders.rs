//! Order repository: reads, status updates, and the checkout write.

use sqlx::{PgConnection, PgPool};

use uniformly_core::checkout::{CartLine, OrderPlan};
use uniformly_core::{OrderId, OrderStatus, Price, ProductId, UserId};

use super::{Page, RepositoryError};
use crate::models::{Order, OrderItemView};

const ORDER_COLUMNS: &str = "id, user_id, status, total_cents, created_at";

#[derive(sqlx::FromRow)]
struct CartLineRow {
    product_id: ProductId,
    quantity: i32,
    price_cents: Price,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order header by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Get an order's lines in the order they were written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, id: OrderId) -> Result<Vec<OrderItemView>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItemView>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity,
                   oi.unit_price_cents, oi.line_total_cents,
                   p.name AS product_name, p.image_url AS product_image_url
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: Page,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Overwrite an order's status. No transition rules apply.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        order.ok_or(RepositoryError::NotFound)
    }
}

// =============================================================================
// Checkout steps (run inside the caller's transaction)
// =============================================================================

/// Lock the user row so concurrent cart inserts for this user wait until the
/// checkout transaction ends. Returns `false` if the user does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> Result<bool, RepositoryError> {
    let locked: Option<UserId> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

    Ok(locked.is_some())
}

/// Read the user's cart lines with current product prices, locking the lines.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn locked_cart_lines(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r"
        SELECT ci.product_id, ci.quantity, p.price_cents
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.id
        FOR UPDATE OF ci
        ",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CartLine {
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.price_cents,
        })
        .collect())
}

/// Write the order header and its lines from a plan. The order starts `pending`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    plan: &OrderPlan,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        r"
        INSERT INTO orders (user_id, status, total_cents)
        VALUES ($1, $2, $3)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(OrderStatus::Pending)
    .bind(plan.total)
    .fetch_one(&mut *conn)
    .await?;

    for item in &plan.items {
        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents, line_total_cents)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(order.id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .execute(&mut *conn)
        .await?;
    }

    Ok(order)
}

/// Empty a user's cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear_cart(conn: &mut PgConnection, user_id: UserId) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}
