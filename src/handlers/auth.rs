use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::Value;
use uuid::Uuid;

use super::{load, users::user_document};
use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::Collection;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ClearToken, TokenResponse};
use crate::models::{parse_body, to_document, LoginInput, Mode, PasswordUpdate, UserDetails, UserInput};
use crate::state::AppState;
use crate::types::{Document, Role};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", get(logout))
        .route("/auth/me", get(me))
        .route("/auth/updatedetails", put(update_details))
        .route("/auth/updatepassword", put(update_password))
}

fn issue_token(user: &Document) -> Result<TokenResponse, ApiError> {
    let text = |field: &str| user.get(field).and_then(Value::as_str);
    let id = text("id")
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| ApiError::internal_server_error("Server Error"))?;
    let role = text("role").and_then(Role::parse).unwrap_or(Role::User);
    let token = generate_jwt(Claims::new(id, role))?;
    Ok(TokenResponse::new(token, StatusCode::OK))
}

/// POST /auth/register - self-service sign up as user or publisher
pub async fn register(State(state): State<AppState>, Json(body): Json<Value>) -> Result<TokenResponse, ApiError> {
    let input: UserInput = parse_body(body)?;
    input.validate(Mode::Create, false)?;

    let user = state
        .store
        .insert(Collection::Users, user_document(input, Some(Role::User))?)
        .await?;
    tracing::info!(user_id = ?user.get("id"), "User registered");
    issue_token(&user)
}

/// POST /auth/login
pub async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> Result<TokenResponse, ApiError> {
    let input: LoginInput = parse_body(body)?;
    let (Some(email), Some(password)) = (input.email, input.password) else {
        return Err(ApiError::bad_request("Please provide an email and password"));
    };

    let user = state
        .store
        .find_one_where(Collection::Users, "email", Value::String(email))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let hash = user.get("password").and_then(Value::as_str).unwrap_or_default();
    if !verify_password(&password, hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }
    issue_token(&user)
}

/// GET /auth/logout
pub async fn logout(Extension(user): Extension<AuthUser>) -> ClearToken {
    tracing::debug!(user_id = %user.id, "User logged out");
    ClearToken
}

/// GET /auth/me
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Document> {
    let (_, doc) = load(state.store.as_ref(), Collection::Users, &user.id.to_string(), "user").await?;
    Ok(ApiResponse::success(Collection::Users.redact(doc)))
}

/// PUT /auth/updatedetails - name and email only
pub async fn update_details(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    let details: UserDetails = parse_body(body)?;
    details.validate()?;

    let updated = state
        .store
        .update(Collection::Users, user.id, to_document(&details))
        .await?
        .ok_or_else(|| ApiError::resource_not_found("user", &user.id.to_string()))?;
    Ok(ApiResponse::success(Collection::Users.redact(updated)))
}

/// PUT /auth/updatepassword - requires the current password, returns a fresh token
pub async fn update_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<TokenResponse, ApiError> {
    let change: PasswordUpdate = parse_body(body)?;
    let (_, doc) = load(state.store.as_ref(), Collection::Users, &user.id.to_string(), "user").await?;

    let hash = doc.get("password").and_then(Value::as_str).unwrap_or_default();
    if !verify_password(&change.current_password, hash) {
        return Err(ApiError::unauthorized("Password is incorrect"));
    }
    change.validate()?;

    let mut patch = Document::new();
    patch.insert("password".into(), Value::String(hash_password(&change.new_password)?));
    let updated = state
        .store
        .update(Collection::Users, user.id, patch)
        .await?
        .ok_or_else(|| ApiError::resource_not_found("user", &user.id.to_string()))?;
    issue_token(&updated)
}
