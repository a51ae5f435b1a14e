//! User route handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use uniformly_core::{Email, UserId};

use super::{Deleted, IdQuery, JsonBody, PageQuery, QueryParams, positive_id};
use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{NewUser, User, UserUpdate, non_blank};
use crate::state::AppState;

/// `GET /users` query.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub id: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| AppError::bad_request("INVALID_EMAIL", e.to_string()))
}

fn user_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found("User not found"),
        RepositoryError::Conflict(message) => AppError::conflict("EMAIL_EXISTS", message),
        other => other.into(),
    }
}

/// One user (`?id=N`) or a page of users, newest first.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UsersQuery>,
) -> Result<Response> {
    let repo = UserRepository::new(state.pool());

    if query.id.is_some() {
        let id: UserId = positive_id(query.id.as_deref(), "INVALID_ID")?;
        let user = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        return Ok(Json(user).into_response());
    }

    Ok(Json(repo.list(query.page.page()).await?).into_response())
}

/// Register a user. Emails are unique after lowercasing.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewUser>,
) -> Result<Response> {
    let raw = non_blank(body.email)
        .ok_or_else(|| AppError::bad_request("MISSING_REQUIRED_FIELDS", "email is required"))?;
    let email = parse_email(&raw)?;
    let full_name = non_blank(body.full_name);

    let user = UserRepository::new(state.pool())
        .create(&email, full_name.as_deref())
        .await
        .map_err(user_error)?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// Update the allow-listed fields of a user.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
    JsonBody(body): JsonBody<UserUpdate>,
) -> Result<Json<User>> {
    let id: UserId = positive_id(query.id.as_deref(), "INVALID_ID")?;
    let email = body.email.as_deref().map(parse_email).transpose()?;
    let full_name = body.full_name.map(non_blank);

    let user = UserRepository::new(state.pool())
        .update(id, email.as_ref(), full_name.as_ref().map(Option::as_deref))
        .await
        .map_err(user_error)?;
    Ok(Json(user))
}

/// Delete a user with their cart and closed orders.
///
/// Refused while any order is pending, paid, or shipped.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
) -> Result<Json<Deleted>> {
    let id: UserId = positive_id(query.id.as_deref(), "INVALID_ID")?;

    let removed = UserRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(message) => {
                AppError::conflict("USER_HAS_OPEN_ORDERS", message)
            }
            other => user_error(other),
        })?;

    tracing::info!(
        target: "audit",
        user_id = %id,
        cart_items = removed.cart_items,
        orders = removed.orders,
        "User deleted"
    );
    Ok(Json(Deleted {
        message: "User deleted",
        id: id.as_i32(),
    }))
}
