use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::Value;

use super::{load, reference};
use crate::auth::can_modify;
use crate::database::Collection;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{parse_body, BootcampInput, Mode};
use crate::query::{advanced_results, QueryParams, Relation, ResultEnvelope};
use crate::state::AppState;
use crate::types::{Document, Role};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/bootcamps", get(list))
        .route("/bootcamps/:id", get(show))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/bootcamps", post(create))
        .route("/bootcamps/:id", put(update).delete(remove))
}

/// GET /bootcamps - list engine with each bootcamp's courses attached
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<ResultEnvelope, ApiError> {
    let params = QueryParams::from_pairs(pairs)?;
    let relations = [Relation::children("courses", Collection::Courses, "bootcamp")];
    Ok(advanced_results(state.store.as_ref(), Collection::Bootcamps, &params, &relations).await?)
}

/// GET /bootcamps/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Document> {
    let (_, mut bootcamp) = load(state.store.as_ref(), Collection::Bootcamps, &id, "bootcamp").await?;
    Relation::children("courses", Collection::Courses, "bootcamp")
        .with_select(&["title"])
        .populate(state.store.as_ref(), &mut bootcamp)
        .await?;
    Ok(ApiResponse::success(bootcamp))
}

/// POST /bootcamps - publishers may own a single bootcamp, admins any number
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    user.require_role(&[Role::Publisher, Role::Admin])?;

    if !user.is_admin() {
        let published = state
            .store
            .find_one_where(Collection::Bootcamps, "user", Value::String(user.id.to_string()))
            .await?;
        if published.is_some() {
            return Err(ApiError::bad_request(format!(
                "The user with ID {} has already published a bootcamp",
                user.id
            )));
        }
    }

    let input: BootcampInput = parse_body(body)?;
    input.validate(Mode::Create)?;
    let mut doc = input.into_document(Mode::Create);
    doc.insert("user".into(), Value::String(user.id.to_string()));

    let bootcamp = state.store.insert(Collection::Bootcamps, doc).await?;
    tracing::info!(bootcamp_id = ?bootcamp.get("id"), user_id = %user.id, "Bootcamp created");
    Ok(ApiResponse::created(bootcamp))
}

/// PUT /bootcamps/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    user.require_role(&[Role::Publisher, Role::Admin])?;
    let (bootcamp_id, bootcamp) = load(state.store.as_ref(), Collection::Bootcamps, &id, "bootcamp").await?;
    if !can_modify(user.id, user.role, reference(&bootcamp, "user")) {
        return Err(ApiError::not_owner(user.id, "update", "bootcamp"));
    }

    let input: BootcampInput = parse_body(body)?;
    input.validate(Mode::Update)?;
    let updated = state
        .store
        .update(Collection::Bootcamps, bootcamp_id, input.into_document(Mode::Update))
        .await?
        .ok_or_else(|| ApiError::resource_not_found("bootcamp", &id))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /bootcamps/:id - removes the bootcamp's courses and reviews with it
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    user.require_role(&[Role::Publisher, Role::Admin])?;
    let (bootcamp_id, bootcamp) = load(state.store.as_ref(), Collection::Bootcamps, &id, "bootcamp").await?;
    if !can_modify(user.id, user.role, reference(&bootcamp, "user")) {
        return Err(ApiError::not_owner(user.id, "delete", "bootcamp"));
    }

    let key = Value::String(bootcamp_id.to_string());
    let courses = state.store.delete_where(Collection::Courses, "bootcamp", &key).await?;
    let reviews = state.store.delete_where(Collection::Reviews, "bootcamp", &key).await?;
    state.store.delete(Collection::Bootcamps, bootcamp_id).await?;
    tracing::info!(%bootcamp_id, courses, reviews, "Bootcamp deleted");

    Ok(ApiResponse::empty())
}
