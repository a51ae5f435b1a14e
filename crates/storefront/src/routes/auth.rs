//! Customer lookup.
//!
//! There are no passwords or sessions: `POST /auth/login` resolves an email to
//! a user and returns it. The client keeps the user ID.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use uniformly_core::Email;

use super::JsonBody;
use crate::error::{AppError, Result};
use crate::models::{User, non_blank};
use crate::state::AppState;

/// `POST /auth/login` body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Associate later Sentry events with this user.
fn set_sentry_user(user: &User) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            email: Some(user.email.to_string()),
            ..Default::default()
        }));
    });
}

/// Find the account for an email.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<User>> {
    let raw = non_blank(body.email)
        .ok_or_else(|| AppError::bad_request("MISSING_REQUIRED_FIELDS", "email is required"))?;
    let email =
        Email::parse(&raw).map_err(|e| AppError::bad_request("INVALID_EMAIL", e.to_string()))?;

    let user = state
        .identity()
        .resolve(&email)
        .await?
        .ok_or_else(|| AppError::NotFound {
            code: "USER_NOT_FOUND",
            message: "No account found for this email".to_owned(),
        })?;

    set_sentry_user(&user);
    Ok(Json(user))
}
