//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database ping)
//!
//! # Cart
//! GET    /cart?userId=N        - Cart lines with product details
//! POST   /cart                 - Add (merges into an existing line)
//! PATCH  /cart?id=N            - Set quantity
//! DELETE /cart?id=N            - Remove a line
//!
//! # Orders
//! GET  /orders?userId=N        - A user's orders, newest first
//! GET  /orders?id=N            - One order with its lines
//! POST /orders                 - Checkout the user's cart
//! PUT  /orders?id=N            - Overwrite status
//!
//! # Directory
//! GET/POST/PUT/DELETE /schools - School CRUD (?id=N, ?search=)
//! GET/POST/PUT/DELETE /users   - User CRUD (?id=N)
//! *    /products               - Catalog (disabled)
//!
//! # Configuration flow
//! GET  /pricing/options        - Items, sizes and prices for a flow
//! POST /pricing/quote          - Price one selection
//! POST /pricing/draft          - Build a pending order draft
//!
//! # Checkout contact
//! POST /send-order-email       - Email the order to the store (rate limited)
//! POST /auth/login             - Look a customer up by email (rate limited)
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod pricing;
pub mod products;
pub mod schools;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, rejection::QueryRejection},
    routing::{get, post},
};
use serde::Deserialize;

use crate::db::Page;
use crate::error::{AppError, Result};
use crate::middleware::{api_rate_limiter, strict_rate_limiter};
use crate::state::AppState;

// =============================================================================
// Extractors
// =============================================================================

/// JSON body whose rejection renders as `INVALID_BODY`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Query string whose rejection renders as `MISSING_PARAMETERS`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("MISSING_PARAMETERS", rejection.body_text())
    }
}

/// `?id=N`
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// `?limit=N&offset=N`, ignoring values that do not parse.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn page(&self) -> Page {
        let number = |raw: &Option<String>| raw.as_deref().and_then(|s| s.trim().parse().ok());
        Page::new(number(&self.limit), number(&self.offset))
    }
}

/// Parse a positive integer ID, failing with `code` when it is absent or bad.
///
/// # Errors
///
/// Returns `AppError::BadRequest` with `code`.
pub fn positive_id<T: From<i32>>(raw: Option<&str>, code: &'static str) -> Result<T> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i32>().ok())
        .filter(|&id| id > 0)
        .map(T::from)
        .ok_or_else(|| AppError::bad_request(code, format!("A valid positive id is required ({code})")))
}

/// Response body for deletes.
#[derive(Debug, serde::Serialize)]
pub struct Deleted {
    pub message: &'static str,
    pub id: i32,
}

// =============================================================================
// Routers
// =============================================================================

/// Routes that need the strict limiter in production.
fn strict_routes() -> Router<AppState> {
    Router::new()
        .route("/send-order-email", post(notifications::send_order_email))
        .route("/auth/login", post(auth::login))
}

/// Everything else.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cart",
            get(cart::show)
                .post(cart::add)
                .patch(cart::update)
                .delete(cart::remove),
        )
        .route(
            "/orders",
            get(orders::show).post(orders::create).put(orders::update_status),
        )
        .route(
            "/schools",
            get(schools::show)
                .post(schools::create)
                .put(schools::update)
                .delete(schools::delete),
        )
        .route(
            "/users",
            get(users::show)
                .post(users::create)
                .put(users::update)
                .delete(users::delete),
        )
        .route(
            "/products",
            get(products::show)
                .post(products::disabled)
                .put(products::disabled)
                .patch(products::disabled)
                .delete(products::disabled),
        )
        .route("/pricing/options", get(pricing::options))
        .route("/pricing/quote", post(pricing::quote))
        .route("/pricing/draft", post(pricing::draft))
}

/// Health checks, never rate limited.
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// All routes without rate limiting.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(api_routes())
        .merge(strict_routes())
}

/// All routes with the per-IP rate limiters applied.
pub fn rate_limited_routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(api_routes().layer(api_rate_limiter()))
        .merge(strict_routes().layer(strict_rate_limiter()))
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use uniformly_core::UserId;

    use super::*;

    #[test]
    fn test_positive_id() {
        assert_eq!(
            positive_id::<UserId>(Some(" 7 "), "INVALID_ID").unwrap(),
            UserId::new(7)
        );
        for raw in [None, Some(""), Some("0"), Some("-2"), Some("abc"), Some("1.5")] {
            assert!(positive_id::<UserId>(raw, "INVALID_ID").is_err(), "{raw:?}");
        }
    }

    #[test]
    fn test_page_query_ignores_garbage() {
        let query = PageQuery {
            limit: Some("many".into()),
            offset: Some("5".into()),
        };
        assert_eq!(query.page(), Page::new(None, Some(5)));
    }
}
