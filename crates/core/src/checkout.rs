//! Checkout planning.
//!
//! Converts the lines of a cart into the snapshot that becomes an order:
//! one planned item per line with the unit price captured as it is now, and
//! an order total equal to the sum of line totals. Persisting the plan is the
//! storefront's job.

use serde::Serialize;

use crate::types::{Price, ProductId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("cart line for product {product_id} has non-positive quantity {quantity}")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
    #[error("order total overflows")]
    Overflow,
}

/// A cart line joined with the product's current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Price,
    pub line_total: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlan {
    pub items: Vec<PlannedItem>,
    pub total: Price,
}

impl OrderPlan {
    #[must_use]
    pub fn items_count(&self) -> usize {
        self.items.len()
    }
}

/// Plan an order from cart lines, preserving their order.
///
/// # Errors
///
/// Returns [`PlanError::EmptyCart`] when there are no lines, and rejects
/// lines with a non-positive quantity or negative price. Arithmetic is
/// checked, so an overflowing total is an error rather than a wrap.
pub fn plan(lines: &[CartLine]) -> Result<OrderPlan, PlanError> {
    if lines.is_empty() {
        return Err(PlanError::EmptyCart);
    }

    let mut total = Price::ZERO;
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(PlanError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }
        if line.unit_price.is_negative() {
            return Err(PlanError::NegativePrice(line.product_id));
        }
        let line_total = line
            .unit_price
            .checked_mul(i64::from(line.quantity))
            .ok_or(PlanError::Overflow)?;
        total = total.checked_add(line_total).ok_or(PlanError::Overflow)?;
        items.push(PlannedItem {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total,
        });
    }

    Ok(OrderPlan { items, total })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn line(product: i32, quantity: i32, price: i64) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            quantity,
            unit_price: Price::new(price),
        }
    }

    #[test]
    fn test_plan_snapshots_prices_and_sums_total() {
        let plan = plan(&[line(1, 2, 850), line(2, 1, 150)]).unwrap();
        assert_eq!(plan.total, Price::new(1850));
        assert_eq!(plan.items_count(), 2);
        assert_eq!(plan.items[0].unit_price, Price::new(850));
        assert_eq!(plan.items[0].line_total, Price::new(1700));
        assert_eq!(plan.items[1].line_total, Price::new(150));
    }

    #[test]
    fn test_total_equals_sum_of_line_totals() {
        let plan = plan(&[line(1, 3, 1100), line(2, 7, 960), line(3, 1, 0)]).unwrap();
        let sum: Price = plan.items.iter().map(|i| i.line_total).sum();
        assert_eq!(plan.total, sum);
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(plan(&[]), Err(PlanError::EmptyCart));
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(matches!(
            plan(&[line(4, 0, 100)]),
            Err(PlanError::InvalidQuantity { quantity: 0, .. })
        ));
        assert_eq!(
            plan(&[line(5, 1, -1)]),
            Err(PlanError::NegativePrice(ProductId::new(5)))
        );
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert_eq!(plan(&[line(1, 2, i64::MAX)]), Err(PlanError::Overflow));
        assert_eq!(
            plan(&[line(1, 1, i64::MAX), line(2, 1, 1)]),
            Err(PlanError::Overflow)
        );
    }
}
