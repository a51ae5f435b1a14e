//! Domain models for the storefront.
//!
//! Row types double as response bodies: they derive `sqlx::FromRow` for
//! reads and `Serialize` with camelCase field names for the JSON API.
//! Request bodies live next to the entity they create or update.

pub mod cart;
pub mod order;
pub mod school;
pub mod user;

pub use cart::{CartItem, CartItemView, CartProduct};
pub use order::{CheckoutReceipt, Order, OrderDetail, OrderItemView};
pub use school::{NewSchool, School, SchoolUpdate};
pub use user::{NewUser, User, UserUpdate};

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" (`None`) from "null"
/// (`Some(None)`). Use with `#[serde(default)]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim a string, treating blank as missing.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
