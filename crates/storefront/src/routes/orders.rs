//! Order route handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use uniformly_core::{OrderId, OrderStatus, UserId};

use super::{IdQuery, JsonBody, PageQuery, QueryParams, positive_id};
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::models::Order;
use crate::state::AppState;

/// `GET /orders` query: `id` or `userId` (with paging).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    pub id: Option<String>,
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

/// `POST /orders` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub user_id: Option<i32>,
}

/// `PUT /orders` body.
#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}

fn order_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found("Order not found"),
        other => other.into(),
    }
}

/// One order with its lines (`?id=N`), or a user's orders (`?userId=N`).
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<OrdersQuery>,
) -> Result<Response> {
    if query.id.is_some() {
        let id: OrderId = positive_id(query.id.as_deref(), "INVALID_ID")?;
        let detail = state.orders().get_order(id).await.map_err(order_not_found)?;
        return Ok(Json(detail).into_response());
    }

    if query.user_id.is_some() {
        let user_id: UserId = positive_id(query.user_id.as_deref(), "INVALID_ID")?;
        let orders = state
            .orders()
            .list_orders(user_id, query.page.page())
            .await?;
        return Ok(Json(orders).into_response());
    }

    Err(AppError::bad_request(
        "MISSING_PARAMETERS",
        "Provide either id or userId",
    ))
}

/// Check out the user's whole cart.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CheckoutRequest>,
) -> Result<Response> {
    let user_id = body
        .user_id
        .filter(|&id| id > 0)
        .map(UserId::new)
        .ok_or_else(|| AppError::bad_request("MISSING_USER_ID", "userId is required"))?;

    let receipt = state.orders().checkout(user_id).await?;
    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

/// Overwrite an order's status.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
    JsonBody(body): JsonBody<StatusUpdate>,
) -> Result<Json<Order>> {
    let id: OrderId = positive_id(query.id.as_deref(), "INVALID_ID")?;

    let raw = body
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_STATUS", "status is required"))?;
    let status: OrderStatus = raw.parse().map_err(|_| {
        AppError::bad_request(
            "INVALID_STATUS",
            format!("Invalid status. Must be one of: {}", allowed_statuses()),
        )
    })?;

    let order = state
        .orders()
        .update_status(id, status)
        .await
        .map_err(order_not_found)?;
    Ok(Json(order))
}

fn allowed_statuses() -> String {
    OrderStatus::ALL
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use serde_json::json;

    use super::*;
    use crate::routes::test_support::expect_code;

    #[tokio::test]
    async fn test_get_requires_a_parameter() {
        expect_code(Method::GET, "/orders", None, StatusCode::BAD_REQUEST, "MISSING_PARAMETERS")
            .await;
        expect_code(Method::GET, "/orders?id=zero", None, StatusCode::BAD_REQUEST, "INVALID_ID")
            .await;
    }

    #[tokio::test]
    async fn test_checkout_requires_user_id() {
        expect_code(
            Method::POST,
            "/orders",
            Some(json!({})),
            StatusCode::BAD_REQUEST,
            "MISSING_USER_ID",
        )
        .await;
    }

    #[tokio::test]
    async fn test_status_validation() {
        expect_code(
            Method::PUT,
            "/orders",
            Some(json!({ "status": "paid" })),
            StatusCode::BAD_REQUEST,
            "INVALID_ID",
        )
        .await;
        expect_code(
            Method::PUT,
            "/orders?id=1",
            Some(json!({})),
            StatusCode::BAD_REQUEST,
            "MISSING_STATUS",
        )
        .await;
        expect_code(
            Method::PUT,
            "/orders?id=1",
            Some(json!({ "status": "bogus" })),
            StatusCode::BAD_REQUEST,
            "INVALID_STATUS",
        )
        .await;
    }

    #[test]
    fn test_allowed_statuses() {
        assert_eq!(allowed_statuses(), "pending, paid, shipped, delivered, cancelled");
    }
}
