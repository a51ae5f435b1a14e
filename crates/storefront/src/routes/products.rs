//! Product catalog route handlers.
//!
//! The catalog is switched off in this build. Product rows still exist as
//! cart and order join targets, but the API lists nothing and refuses writes.

use axum::{Json, response::{IntoResponse, Response}};

use uniformly_core::ProductId;

use super::{IdQuery, QueryParams, positive_id};
use crate::error::{AppError, Result};

/// Always an empty list, or 404 for a specific product.
pub async fn show(QueryParams(query): QueryParams<IdQuery>) -> Result<Response> {
    if query.id.is_some() {
        let _: ProductId = positive_id(query.id.as_deref(), "INVALID_ID")?;
        return Err(AppError::not_found("Product not found"));
    }
    Ok(Json(Vec::<serde_json::Value>::new()).into_response())
}

/// Catalog writes are disabled.
pub async fn disabled() -> AppError {
    AppError::MethodDisabled
}
