use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::validate_jwt;
use crate::database::Collection;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{Document, Role};

/// Authenticated user context, loaded fresh from the store on every request
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn from_document(doc: &Document) -> Option<Self> {
        let text = |field: &str| doc.get(field).and_then(Value::as_str);
        Some(Self {
            id: text("id").and_then(|id| Uuid::parse_str(id).ok())?,
            name: text("name").unwrap_or_default().to_string(),
            email: text("email").unwrap_or_default().to_string(),
            role: text("role").and_then(Role::parse)?,
        })
    }

    /// 403 unless the user's role is one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "User role {} is not authorized to access this route",
                self.role
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// JWT authentication middleware that validates tokens and loads the user
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let not_authorized = || ApiError::unauthorized("Not authorized to access this route");

    let token = extract_token(request.headers()).ok_or_else(not_authorized)?;
    let claims = validate_jwt(&token)?;

    let user = state
        .store
        .find_by_id(Collection::Users, claims.sub)
        .await?
        .as_ref()
        .and_then(AuthUser::from_document)
        .ok_or_else(|| {
            tracing::warn!(user_id = %claims.sub, "Token for unknown user");
            not_authorized()
        })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Bearer token from the Authorization header, falling back to the `token` cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            return (!token.is_empty()).then(|| token.to_string());
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "token")
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
