//! HTTP routes. Every `/api/*` route is also served without the prefix.

pub mod admin;
pub mod auth;
pub mod health;
pub mod plans;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::error::ApiError;
use crate::logging;
use crate::AppState;

/// Routes mounted both under `/api` and at the root.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::api_router())
        .merge(auth::router(state.clone()))
        .merge(plans::router(state.clone()))
        .nest("/admin", admin::router(state))
}

/// The complete application with CORS, request logging and the JSON 404.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors.origins);

    Router::new()
        .merge(health::router())
        .nest("/api", api_router(state.clone()))
        .merge(api_router(state))
        .fallback(not_found)
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
}

fn cors_layer(origins: &str) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found. Please check your URL."
        })),
    )
}

/// Run document access and password hashing on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Blocking task failed: {}", e)))?
}

/// Trimmed value of a required text field, if present and non-blank.
pub(crate) fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Passwords are taken verbatim; only emptiness is rejected.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}
