use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::config;

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            data,
            status_code: Some(StatusCode::CREATED),
        }
    }
}

impl ApiResponse<serde_json::Map<String, serde_json::Value>> {
    /// `{"success": true, "data": {}}`, returned by deletes
    pub fn empty() -> Self {
        Self::success(serde_json::Map::new())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "success": true, "data": data_value }))).into_response()
    }
}

/// `{"success": true, "token": ...}` plus the same token as an http-only cookie
#[derive(Debug)]
pub struct TokenResponse {
    pub token: String,
    pub status_code: StatusCode,
}

impl TokenResponse {
    pub fn new(token: String, status_code: StatusCode) -> Self {
        Self { token, status_code }
    }
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        let security = &config::config().security;
        let max_age = security.cookie_expiry_days * 24 * 60 * 60;
        let cookie = token_cookie(&self.token, max_age, security.secure_cookies);
        let mut response = (self.status_code, Json(json!({ "success": true, "token": self.token }))).into_response();
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        response
    }
}

/// Overwrite the token cookie so the browser drops it
pub struct ClearToken;

impl IntoResponse for ClearToken {
    fn into_response(self) -> Response {
        let cookie = token_cookie("none", 10, config::config().security.secure_cookies);
        let mut response = ApiResponse::empty().into_response();
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        response
    }
}

fn token_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!("token={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax", token, max_age_secs);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_token_and_flags() {
        assert_eq!(
            token_cookie("abc", 60, true),
            "token=abc; Path=/; Max-Age=60; HttpOnly; SameSite=Lax; Secure"
        );
        assert!(!token_cookie("abc", 60, false).contains("Secure"));
    }

    #[test]
    fn token_response_sets_cookie_header() {
        let response = TokenResponse::new("abc".into(), StatusCode::OK).into_response();
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("token=abc;"));
    }
}
