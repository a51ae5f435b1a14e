//! Cart route handlers.
//!
//! A user has at most one line per product. Posting a product that is
//! already in the cart adds to that line's quantity and answers 200; a new
//! line answers 201.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use uniformly_core::{CartItemId, ProductId, UserId};

use super::{Deleted, IdQuery, JsonBody, QueryParams, positive_id};
use crate::db::{CartRepository, MergeOutcome, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::{CartItem, CartItemView};
use crate::state::AppState;

/// `GET /cart` query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    pub user_id: Option<String>,
}

/// `POST /cart` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    #[serde(default)]
    pub user_id: Option<i32>,
    #[serde(default)]
    pub product_id: Option<i32>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// `PATCH /cart` body.
#[derive(Debug, Default, Deserialize)]
pub struct SetQuantity {
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Accept `1..=i32::MAX`.
fn positive_quantity(quantity: Option<i64>) -> Option<i32> {
    quantity
        .filter(|&q| q > 0)
        .and_then(|q| i32::try_from(q).ok())
}

fn cart_error(err: RepositoryError, not_found: &str) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found(not_found),
        RepositoryError::OutOfRange(_) => {
            AppError::bad_request("INVALID_QUANTITY", "Cart quantity is too large")
        }
        other => other.into(),
    }
}

/// List the user's cart lines with product details.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CartQuery>,
) -> Result<Json<Vec<CartItemView>>> {
    let user_id: UserId = positive_id(query.user_id.as_deref(), "MISSING_USER_ID")?;
    let items = CartRepository::new(state.pool()).get_cart(user_id).await?;
    Ok(Json(items))
}

/// Add a product, merging into an existing line.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<AddToCart>,
) -> Result<Response> {
    let (Some(user_id), Some(product_id), Some(quantity)) = (
        body.user_id.filter(|&id| id > 0),
        body.product_id.filter(|&id| id > 0),
        positive_quantity(body.quantity),
    ) else {
        return Err(AppError::bad_request(
            "MISSING_REQUIRED_FIELDS",
            "userId, productId and a positive quantity are required",
        ));
    };

    let (item, outcome) = CartRepository::new(state.pool())
        .add_or_merge(UserId::new(user_id), ProductId::new(product_id), quantity)
        .await
        .map_err(|e| cart_error(e, "User or product not found"))?;

    let status = match outcome {
        MergeOutcome::Created => StatusCode::CREATED,
        MergeOutcome::Updated => StatusCode::OK,
    };
    tracing::debug!(cart_item_id = %item.id, quantity = item.quantity, ?outcome, "Cart line saved");
    Ok((status, Json(item)).into_response())
}

/// Replace a line's quantity.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
    JsonBody(body): JsonBody<SetQuantity>,
) -> Result<Json<CartItem>> {
    let id: CartItemId = positive_id(query.id.as_deref(), "INVALID_ID")?;
    let quantity = positive_quantity(body.quantity).ok_or_else(|| {
        AppError::bad_request("INVALID_QUANTITY", "quantity must be a positive integer")
    })?;

    let item = CartRepository::new(state.pool())
        .set_quantity(id, quantity)
        .await
        .map_err(|e| cart_error(e, "Cart item not found"))?;
    Ok(Json(item))
}

/// Remove a line. Removing a missing line is a 404.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
) -> Result<Json<Deleted>> {
    let id: CartItemId = positive_id(query.id.as_deref(), "INVALID_ID")?;

    CartRepository::new(state.pool())
        .remove(id)
        .await
        .map_err(|e| cart_error(e, "Cart item not found"))?;

    Ok(Json(Deleted {
        message: "Cart item removed",
        id: id.as_i32(),
    }))
}
