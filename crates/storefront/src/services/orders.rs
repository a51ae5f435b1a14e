//! Checkout and order queries.
//!
//! Checkout turns a user's cart into a pending order in one transaction:
//!
//! 1. lock the user row (concurrent cart writes for this user wait)
//! 2. read and lock the cart lines with current product prices
//! 3. plan the order (line totals, total) with [`uniformly_core::checkout::plan`]
//! 4. insert the order header and its lines
//! 5. empty the cart
//!
//! The whole unit runs under a deadline. If it expires the transaction is
//! dropped, which rolls it back.

use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use uniformly_core::checkout::{self, PlanError};
use uniformly_core::{OrderId, OrderStatus, UserId};

use crate::db::orders::{clear_cart, insert_order, lock_user, locked_cart_lines};
use crate::db::{OrderRepository, Page, RepositoryError};
use crate::models::{CheckoutReceipt, Order, OrderDetail};

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user has nothing in their cart (or does not exist).
    #[error("cart is empty")]
    EmptyCart,

    /// A stored cart line could not be priced.
    #[error("cart cannot be checked out: {0}")]
    InvalidCart(PlanError),

    /// The transaction did not finish before the deadline.
    #[error("checkout timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl From<PlanError> for CheckoutError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::EmptyCart => Self::EmptyCart,
            other => Self::InvalidCart(other),
        }
    }
}

/// Order operations backed by `PostgreSQL`.
#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    deadline: Duration,
}

impl OrderService {
    #[must_use]
    pub const fn new(pool: PgPool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }

    /// Convert the user's cart into a pending order and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to order. No
    /// order is written and the cart is untouched on any error.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn checkout(&self, user_id: UserId) -> Result<CheckoutReceipt, CheckoutError> {
        let receipt = tokio::time::timeout(self.deadline, self.checkout_unit(user_id))
            .await
            .map_err(|_| CheckoutError::Timeout(self.deadline))??;

        tracing::info!(
            order_id = %receipt.order.id,
            items = receipt.items_count,
            total = %receipt.order.total_cents,
            "Order placed"
        );
        Ok(receipt)
    }

    async fn checkout_unit(&self, user_id: UserId) -> Result<CheckoutReceipt, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        if !lock_user(&mut *tx, user_id).await? {
            return Err(CheckoutError::EmptyCart);
        }

        let lines = locked_cart_lines(&mut *tx, user_id).await?;
        let plan = checkout::plan(&lines)?;

        let order = insert_order(&mut *tx, user_id, &plan).await?;
        clear_cart(&mut *tx, user_id).await?;

        tx.commit().await?;

        Ok(CheckoutReceipt {
            order,
            items_count: plan.items_count(),
        })
    }

    /// An order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<OrderDetail, RepositoryError> {
        let repo = OrderRepository::new(&self.pool);
        let order = repo.get(id).await?.ok_or(RepositoryError::NotFound)?;
        let items = repo.items(id).await?;
        Ok(OrderDetail { order, items })
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        user_id: UserId,
        page: Page,
    ) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .list_for_user(user_id, page)
            .await
    }

    /// Overwrite an order's status. Setting the current status again succeeds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let order = OrderRepository::new(&self.pool)
            .update_status(id, status)
            .await?;
        tracing::info!(order_id = %id, status = %status, "Order status updated");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use uniformly_core::ProductId;

    use super::*;

    #[test]
    fn test_plan_errors_map_to_checkout_errors() {
        assert!(matches!(
            CheckoutError::from(PlanError::EmptyCart),
            CheckoutError::EmptyCart
        ));
        assert!(matches!(
            CheckoutError::from(PlanError::NegativePrice(ProductId::new(3))),
            CheckoutError::InvalidCart(_)
        ));
    }
}
