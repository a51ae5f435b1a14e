//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"error": "...", "code": "...", "hint": "..."}`. Server-side failures are
//! captured to Sentry and logged, and the client only sees an opaque message.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use uniformly_core::confirmation::ConfirmationError;

use crate::db::RepositoryError;
use crate::services::{AUTH_HINT, CheckoutError, NotificationError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("{message}")]
    BadRequest {
        code: &'static str,
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{message}")]
    NotFound {
        code: &'static str,
        message: String,
    },

    /// A uniqueness or integrity rule blocked the write.
    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
    },

    /// Catalog mutations are switched off.
    #[error("Product catalog is disabled")]
    MethodDisabled,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Sending the order confirmation failed.
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

const INTERNAL: &str = "Internal server error";

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            code: "NOT_FOUND",
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Whether this error is our fault rather than the client's.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(err) => matches!(err, RepositoryError::Database(_)),
            Self::Checkout(err) => !matches!(err, CheckoutError::EmptyCart),
            Self::Notification(err) => !matches!(
                err,
                NotificationError::Validation(_) | NotificationError::Authentication(_)
            ),
            Self::Internal(_) => true,
            _ => false,
        }
    }

    /// Status, code, client-facing message and hint.
    fn parts(&self) -> (StatusCode, Option<&'static str>, String, Option<&'static str>) {
        match self {
            Self::BadRequest { code, message } | Self::Conflict { code, message } => {
                (StatusCode::BAD_REQUEST, Some(*code), message.clone(), None)
            }
            Self::NotFound { code, message } => {
                (StatusCode::NOT_FOUND, Some(*code), message.clone(), None)
            }
            Self::MethodDisabled => (
                StatusCode::METHOD_NOT_ALLOWED,
                Some("METHOD_DISABLED"),
                self.to_string(),
                None,
            ),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                Some("RATE_LIMITED"),
                "Too many requests, please slow down".to_owned(),
                None,
            ),
            Self::Database(err) => match err {
                RepositoryError::NotFound => (
                    StatusCode::NOT_FOUND,
                    Some("NOT_FOUND"),
                    "Not found".to_owned(),
                    None,
                ),
                RepositoryError::Conflict(message) | RepositoryError::OutOfRange(message) => {
                    (StatusCode::BAD_REQUEST, None, message.clone(), None)
                }
                _ => internal(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => (
                    StatusCode::BAD_REQUEST,
                    Some("EMPTY_CART"),
                    "Cart is empty".to_owned(),
                    None,
                ),
                CheckoutError::Timeout(_) => timeout(),
                CheckoutError::InvalidCart(_) | CheckoutError::Repository(_) => internal(),
            },
            Self::Notification(err) => notification_parts(err),
            Self::Internal(_) => internal(),
        }
    }
}

fn internal() -> (StatusCode, Option<&'static str>, String, Option<&'static str>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Some("INTERNAL_ERROR"),
        INTERNAL.to_owned(),
        None,
    )
}

fn timeout() -> (StatusCode, Option<&'static str>, String, Option<&'static str>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Some("TIMEOUT"),
        "The operation timed out, please try again".to_owned(),
        None,
    )
}

fn notification_parts(
    err: &NotificationError,
) -> (StatusCode, Option<&'static str>, String, Option<&'static str>) {
    match err {
        NotificationError::Validation(invalid) => {
            let (code, message) = match invalid {
                ConfirmationError::MissingCustomerFields => (
                    "MISSING_CUSTOMER_FIELDS",
                    "Missing customer fields (name, phone, address are required)",
                ),
                ConfirmationError::InvalidPhone(_) => (
                    "INVALID_PHONE",
                    "Invalid Pakistani phone format (use 03XXXXXXXXX or +923XXXXXXXXX)",
                ),
                ConfirmationError::NoItems => ("NO_ITEMS", "No items provided"),
                ConfirmationError::LineTotalOverflow { .. } => {
                    ("INVALID_QUANTITY", "Line total is too large")
                }
            };
            (StatusCode::BAD_REQUEST, Some(code), message.to_owned(), None)
        }
        NotificationError::NotConfigured => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("MAIL_NOT_CONFIGURED"),
            "Email is not configured on the server".to_owned(),
            None,
        ),
        NotificationError::Authentication(_) => (
            StatusCode::UNAUTHORIZED,
            Some("MAIL_AUTH_FAILED"),
            "Email authentication failed".to_owned(),
            Some(AUTH_HINT),
        ),
        NotificationError::Send(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("MAIL_SEND_FAILED"),
            "Failed to send email".to_owned(),
            None,
        ),
        NotificationError::Timeout(_) => timeout(),
        NotificationError::Template(_)
        | NotificationError::InvalidAddress(_)
        | NotificationError::Setup(_) => internal(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if let Self::Notification(NotificationError::Authentication(err)) = &self {
            tracing::warn!(error = %err, "SMTP authentication rejected");
        }

        let (status, code, error, hint) = self.parts();
        (status, Json(ErrorBody { error, code, hint })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("INVALID_BODY", rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
