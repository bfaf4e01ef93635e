//! Account administration, admin only.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde_json::Value;

use super::load;
use crate::auth::hash_password;
use crate::database::Collection;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{parse_body, Mode, UserInput};
use crate::query::{advanced_results, QueryParams, ResultEnvelope};
use crate::state::AppState;
use crate::types::{Document, Role};

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/:id", get(show).put(update).delete(remove))
}

/// Turn a user body into a document, hashing any password it carries.
pub(crate) fn user_document(input: UserInput, default_role: Option<Role>) -> Result<Document, ApiError> {
    let mut doc = Document::new();
    if let Some(name) = input.name {
        doc.insert("name".into(), Value::String(name));
    }
    if let Some(email) = input.email {
        doc.insert("email".into(), Value::String(email));
    }
    if let Some(password) = input.password {
        doc.insert("password".into(), Value::String(hash_password(&password)?));
    }
    if let Some(role) = input.role.or(default_role) {
        doc.insert("role".into(), Value::String(role.as_str().to_string()));
    }
    Ok(doc)
}

/// GET /users
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<ResultEnvelope, ApiError> {
    user.require_role(&[Role::Admin])?;
    let params = QueryParams::from_pairs(pairs)?;
    Ok(advanced_results(state.store.as_ref(), Collection::Users, &params, &[]).await?)
}

/// GET /users/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    user.require_role(&[Role::Admin])?;
    let (_, found) = load(state.store.as_ref(), Collection::Users, &id, "user").await?;
    Ok(ApiResponse::success(Collection::Users.redact(found)))
}

/// POST /users - admins may create accounts of any role
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    user.require_role(&[Role::Admin])?;
    let input: UserInput = parse_body(body)?;
    input.validate(Mode::Create, true)?;

    let created = state
        .store
        .insert(Collection::Users, user_document(input, Some(Role::User))?)
        .await?;
    tracing::info!(user_id = ?created.get("id"), admin_id = %user.id, "User created by admin");
    Ok(ApiResponse::created(Collection::Users.redact(created)))
}

/// PUT /users/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    user.require_role(&[Role::Admin])?;
    let (user_id, _) = load(state.store.as_ref(), Collection::Users, &id, "user").await?;

    let input: UserInput = parse_body(body)?;
    input.validate(Mode::Update, true)?;
    let updated = state
        .store
        .update(Collection::Users, user_id, user_document(input, None)?)
        .await?
        .ok_or_else(|| ApiError::resource_not_found("user", &id))?;
    Ok(ApiResponse::success(Collection::Users.redact(updated)))
}

/// DELETE /users/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    user.require_role(&[Role::Admin])?;
    let (user_id, _) = load(state.store.as_ref(), Collection::Users, &id, "user").await?;
    state.store.delete(Collection::Users, user_id).await?;
    Ok(ApiResponse::empty())
}
