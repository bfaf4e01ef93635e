use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::config;
use crate::handlers::{auth, bootcamps, courses, reviews, users};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .nest(API_PREFIX, api_routes(state.clone()))
        .with_state(state);

    if config().security.enable_cors {
        app = app.layer(cors_layer());
    }
    if config().api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn api_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .merge(auth::public_routes())
        .merge(bootcamps::public_routes())
        .merge(courses::public_routes())
        .merge(reviews::public_routes());

    // Everything below requires a valid token
    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(bootcamps::protected_routes())
        .merge(courses::protected_routes())
        .merge(reviews::protected_routes())
        .merge(users::protected_routes())
        .route_layer(from_fn_with_state(state, jwt_auth_middleware));

    public.merge(protected)
}

fn cors_layer() -> CorsLayer {
    if crate::is_development!() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(origins))
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "DevCamper API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/api/v1/auth/* (register and login public)",
                "bootcamps": "/api/v1/bootcamps[/:id] (writes: publisher or admin)",
                "courses": "/api/v1/courses[/:id], /api/v1/bootcamps/:id/courses",
                "reviews": "/api/v1/reviews[/:id], /api/v1/bootcamps/:id/reviews",
                "users": "/api/v1/users[/:id] (admin)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
