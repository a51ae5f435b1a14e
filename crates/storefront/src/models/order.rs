//! Order types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use uniformly_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// An order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Sum of the line totals, fixed at checkout.
    pub total_cents: Price,
    pub created_at: DateTime<Utc>,
}

/// A frozen order line joined with product display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price_cents: Price,
    pub line_total_cents: Price,
    pub product_name: String,
    pub product_image_url: Option<String>,
}

/// `GET /orders?id=N`: the order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemView>,
}

/// `POST /orders`: the created order and how many lines were written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    #[serde(flatten)]
    pub order: Order,
    pub items_count: usize,
}
