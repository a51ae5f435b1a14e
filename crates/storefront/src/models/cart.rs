//! Cart line types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use uniformly_core::{CartItemId, Price, ProductId, SchoolId, UserId};

/// A cart row as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Last touched; refreshed on every quantity change.
    pub created_at: DateTime<Utc>,
}

/// Product fields shown alongside a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: ProductId,
    pub school_id: SchoolId,
    pub name: String,
    pub price_cents: Price,
    pub image_url: Option<String>,
}

/// A cart line joined with its product, as returned by `GET /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub product: CartProduct,
}
