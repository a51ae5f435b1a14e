//! Guided option flow: option menus, quotes and pending order drafts.
//!
//! These handlers are pure; they never touch the database.

use axum::Json;
use serde::Deserialize;
use tracing::instrument;

use uniformly_core::draft::{DraftError, OrderDraft};
use uniformly_core::pricing::{
    self, Flow, Gender, Level, OptionMenu, PricingError, Quote, Season, Selection,
};

use super::{JsonBody, QueryParams};
use crate::error::{AppError, Result};

/// `GET /pricing/options` query.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsQuery {
    pub gender: Option<String>,
    pub season: Option<String>,
    pub level: Option<String>,
}

/// `POST /pricing/draft` body.
#[derive(Debug, Default, Deserialize)]
pub struct DraftRequest {
    #[serde(default)]
    pub selections: Vec<serde_json::Value>,
}

fn invalid_selection(message: impl Into<String>) -> AppError {
    AppError::bad_request("INVALID_SELECTION", message)
}

fn facet<T>(raw: Option<&str>, name: &str) -> Result<T>
where
    T: std::str::FromStr<Err = PricingError>,
{
    raw.ok_or_else(|| invalid_selection(format!("{name} is required")))?
        .parse()
        .map_err(|e: PricingError| invalid_selection(e.to_string()))
}

fn selection(value: serde_json::Value) -> Result<Selection> {
    serde_json::from_value(value).map_err(|e| invalid_selection(e.to_string()))
}

fn pricing_error(err: PricingError) -> AppError {
    match err {
        PricingError::QuantityOutOfRange(_) => {
            AppError::bad_request("INVALID_QUANTITY", err.to_string())
        }
        PricingError::UnknownFacet { .. } => invalid_selection(err.to_string()),
    }
}

/// Items, sizes and prices offered for one (gender, season, level) flow.
#[instrument]
pub async fn options(QueryParams(query): QueryParams<OptionsQuery>) -> Result<Json<OptionMenu>> {
    let flow = Flow::new(
        facet::<Gender>(query.gender.as_deref(), "gender")?,
        facet::<Season>(query.season.as_deref(), "season")?,
        facet::<Level>(query.level.as_deref(), "level")?,
    );
    Ok(Json(pricing::option_menu(flow)))
}

/// Price a single selection.
#[instrument(skip(body))]
pub async fn quote(JsonBody(body): JsonBody<serde_json::Value>) -> Result<Json<Quote>> {
    let selection = selection(body)?;
    pricing::quote(&selection).map(Json).map_err(pricing_error)
}

/// Build a pending order draft from configured selections.
#[instrument(skip(body))]
pub async fn draft(JsonBody(body): JsonBody<DraftRequest>) -> Result<Json<OrderDraft>> {
    let selections = body
        .selections
        .into_iter()
        .map(selection)
        .collect::<Result<Vec<_>>>()?;

    OrderDraft::from_selections(&selections)
        .map(Json)
        .map_err(|err| match err {
            DraftError::Empty => AppError::bad_request("EMPTY_DRAFT", err.to_string()),
            DraftError::Incomplete { .. } => {
                AppError::bad_request("INCOMPLETE_SELECTION", err.to_string())
            }
            DraftError::Pricing(inner) => pricing_error(inner),
        })
}
