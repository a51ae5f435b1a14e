//! `POST /send-order-email`: email a checkout summary to the store.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use uniformly_core::confirmation::ConfirmationRequest;

use super::JsonBody;
use crate::error::Result;
use crate::state::AppState;

/// Success body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSent {
    pub ok: bool,
    pub message_id: String,
}

/// Validate and send the order confirmation.
#[instrument(skip(state, body))]
pub async fn send_order_email(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ConfirmationRequest>,
) -> Result<Json<EmailSent>> {
    let sent = state.notifications().send_order_confirmation(body).await?;
    Ok(Json(EmailSent {
        ok: true,
        message_id: sent.message_id,
    }))
}
