use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::Value;

use super::{load, parse_id, reference};
use crate::aggregate::{self, AggregateKind};
use crate::auth::can_modify;
use crate::database::{Collection, StoreError};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{parse_body, Mode, ReviewInput};
use crate::query::{advanced_results, ListEnvelope, QueryParams, Relation, ResultEnvelope};
use crate::state::AppState;
use crate::types::{Document, Role};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list))
        .route("/reviews/:id", get(show))
        .route("/bootcamps/:id/reviews", get(for_bootcamp))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/bootcamps/:id/reviews", post(create))
        .route("/reviews/:id", put(update).delete(remove))
}

fn bootcamp_summary() -> Relation {
    Relation::parent("bootcamp", Collection::Bootcamps, &["name", "description"])
}

/// GET /reviews
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<ResultEnvelope, ApiError> {
    let params = QueryParams::from_pairs(pairs)?;
    Ok(advanced_results(state.store.as_ref(), Collection::Reviews, &params, &[bootcamp_summary()]).await?)
}

/// GET /bootcamps/:id/reviews
pub async fn for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<String>,
) -> Result<ListEnvelope, ApiError> {
    let bootcamp_id = parse_id(&bootcamp_id, "bootcamp")?;
    let reviews = state
        .store
        .find_where(Collection::Reviews, "bootcamp", Value::String(bootcamp_id.to_string()))
        .await?;
    Ok(ListEnvelope::new(reviews))
}

/// GET /reviews/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Document> {
    let (_, mut review) = load(state.store.as_ref(), Collection::Reviews, &id, "review").await?;
    bootcamp_summary().populate(state.store.as_ref(), &mut review).await?;
    Ok(ApiResponse::success(review))
}

/// POST /bootcamps/:id/reviews - one review per user per bootcamp
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(bootcamp_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    user.require_role(&[Role::User, Role::Admin])?;
    let (bootcamp_id, _) = load(state.store.as_ref(), Collection::Bootcamps, &bootcamp_id, "bootcamp").await?;

    let input: ReviewInput = parse_body(body)?;
    input.validate(Mode::Create)?;
    let mut doc = input.into_document();
    doc.insert("bootcamp".into(), Value::String(bootcamp_id.to_string()));
    doc.insert("user".into(), Value::String(user.id.to_string()));

    let review = match state.store.insert(Collection::Reviews, doc).await {
        Ok(review) => review,
        Err(StoreError::Duplicate(_)) => {
            return Err(ApiError::bad_request("You have already reviewed this bootcamp"))
        }
        Err(e) => return Err(e.into()),
    };
    aggregate::refresh(state.store.as_ref(), AggregateKind::AverageRating, bootcamp_id).await;
    Ok(ApiResponse::created(review))
}

/// PUT /reviews/:id - owner or admin; the average rating is left as is
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    let (review_id, review) = load(state.store.as_ref(), Collection::Reviews, &id, "review").await?;
    if !can_modify(user.id, user.role, reference(&review, "user")) {
        return Err(ApiError::not_owner(user.id, "update", "review"));
    }

    let input: ReviewInput = parse_body(body)?;
    input.validate(Mode::Update)?;
    let updated = state
        .store
        .update(Collection::Reviews, review_id, input.into_document())
        .await?
        .ok_or_else(|| ApiError::resource_not_found("review", &id))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /reviews/:id - owner or admin; refreshes the bootcamp's average rating
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let (review_id, review) = load(state.store.as_ref(), Collection::Reviews, &id, "review").await?;
    if !can_modify(user.id, user.role, reference(&review, "user")) {
        return Err(ApiError::not_owner(user.id, "delete", "review"));
    }

    state.store.delete(Collection::Reviews, review_id).await?;
    if let Some(bootcamp_id) = reference(&review, "bootcamp") {
        aggregate::refresh(state.store.as_ref(), AggregateKind::AverageRating, bootcamp_id).await;
    }
    Ok(ApiResponse::empty())
}
