//! School directory route handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use uniformly_core::SchoolId;

use super::{Deleted, IdQuery, JsonBody, PageQuery, QueryParams, positive_id};
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::models::{NewSchool, School, SchoolUpdate};
use crate::state::AppState;

/// `GET /schools` query.
#[derive(Debug, Default, Deserialize)]
pub struct SchoolsQuery {
    pub id: Option<String>,
    pub search: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

const REQUIRED: &str = "name and city are required";

fn school_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found("School not found"),
        RepositoryError::Conflict(message) => AppError::conflict("SCHOOL_IN_USE", message),
        other => other.into(),
    }
}

/// One school (`?id=N`) or a search over the directory.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SchoolsQuery>,
) -> Result<Response> {
    if query.id.is_some() {
        let id: SchoolId = positive_id(query.id.as_deref(), "INVALID_ID")?;
        let school = state
            .schools()
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("School not found"))?;
        return Ok(Json(school).into_response());
    }

    let schools = state
        .schools()
        .list(query.search.as_deref(), query.page.page())
        .await?;
    Ok(Json(schools).into_response())
}

/// Add a school.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewSchool>,
) -> Result<Response> {
    let school = body
        .validated()
        .ok_or_else(|| AppError::bad_request("MISSING_REQUIRED_FIELDS", REQUIRED))?;
    let created = state.schools().create(&school).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// Update the allow-listed fields of a school.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
    JsonBody(body): JsonBody<SchoolUpdate>,
) -> Result<Json<School>> {
    let id: SchoolId = positive_id(query.id.as_deref(), "INVALID_ID")?;
    let update = body
        .validated()
        .ok_or_else(|| AppError::bad_request("MISSING_REQUIRED_FIELDS", REQUIRED))?;

    let school = state
        .schools()
        .update(id, &update)
        .await
        .map_err(school_error)?;
    Ok(Json(school))
}

/// Delete a school and its products.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdQuery>,
) -> Result<Json<Deleted>> {
    let id: SchoolId = positive_id(query.id.as_deref(), "INVALID_ID")?;
    state.schools().delete(id).await.map_err(school_error)?;
    Ok(Json(Deleted {
        message: "School deleted",
        id: id.as_i32(),
    }))
}
