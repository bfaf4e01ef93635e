use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::Value;

use super::{load, parse_id, reference};
use crate::aggregate::{self, AggregateKind};
use crate::auth::can_modify;
use crate::database::Collection;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{parse_body, CourseInput, Mode};
use crate::query::{advanced_results, ListEnvelope, QueryParams, Relation, ResultEnvelope};
use crate::state::AppState;
use crate::types::{Document, Role};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list))
        .route("/courses/:id", get(show))
        .route("/bootcamps/:id/courses", get(for_bootcamp))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/bootcamps/:id/courses", post(create))
        .route("/courses/:id", put(update).delete(remove))
}

fn bootcamp_summary() -> Relation {
    Relation::parent("bootcamp", Collection::Bootcamps, &["name", "description"])
}

/// GET /courses
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<ResultEnvelope, ApiError> {
    let params = QueryParams::from_pairs(pairs)?;
    Ok(advanced_results(state.store.as_ref(), Collection::Courses, &params, &[bootcamp_summary()]).await?)
}

/// GET /bootcamps/:id/courses - every course of one bootcamp, unpaginated
pub async fn for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<String>,
) -> Result<ListEnvelope, ApiError> {
    let bootcamp_id = parse_id(&bootcamp_id, "bootcamp")?;
    let courses = state
        .store
        .find_where(Collection::Courses, "bootcamp", Value::String(bootcamp_id.to_string()))
        .await?;
    Ok(ListEnvelope::new(courses))
}

/// GET /courses/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Document> {
    let (_, mut course) = load(state.store.as_ref(), Collection::Courses, &id, "course").await?;
    bootcamp_summary().populate(state.store.as_ref(), &mut course).await?;
    Ok(ApiResponse::success(course))
}

/// POST /bootcamps/:id/courses - bootcamp owner or admin; refreshes the bootcamp's average cost
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(bootcamp_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    user.require_role(&[Role::Publisher, Role::Admin])?;
    let (bootcamp_id, bootcamp) =
        load(state.store.as_ref(), Collection::Bootcamps, &bootcamp_id, "bootcamp").await?;
    if !can_modify(user.id, user.role, reference(&bootcamp, "user")) {
        return Err(ApiError::unauthorized(format!(
            "User {} is not authorized to add a course to bootcamp {}",
            user.id, bootcamp_id
        )));
    }

    let input: CourseInput = parse_body(body)?;
    input.validate(Mode::Create)?;
    let mut doc = input.into_document(Mode::Create);
    doc.insert("bootcamp".into(), Value::String(bootcamp_id.to_string()));
    doc.insert("user".into(), Value::String(user.id.to_string()));

    let course = state.store.insert(Collection::Courses, doc).await?;
    aggregate::refresh(state.store.as_ref(), AggregateKind::AverageCost, bootcamp_id).await;
    Ok(ApiResponse::success(course))
}

/// PUT /courses/:id - owner or admin; the average cost is left as is
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    let (course_id, course) = load(state.store.as_ref(), Collection::Courses, &id, "course").await?;
    if !can_modify(user.id, user.role, reference(&course, "user")) {
        return Err(ApiError::not_owner(user.id, "update", "course"));
    }

    let input: CourseInput = parse_body(body)?;
    input.validate(Mode::Update)?;
    let updated = state
        .store
        .update(Collection::Courses, course_id, input.into_document(Mode::Update))
        .await?
        .ok_or_else(|| ApiError::resource_not_found("course", &id))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /courses/:id - owner or admin; refreshes the bootcamp's average cost
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let (course_id, course) = load(state.store.as_ref(), Collection::Courses, &id, "course").await?;
    if !can_modify(user.id, user.role, reference(&course, "user")) {
        return Err(ApiError::not_owner(user.id, "delete", "course"));
    }

    state.store.delete(Collection::Courses, course_id).await?;
    if let Some(bootcamp_id) = reference(&course, "bootcamp") {
        aggregate::refresh(state.store.as_ref(), AggregateKind::AverageCost, bootcamp_id).await;
    }
    Ok(ApiResponse::empty())
}
