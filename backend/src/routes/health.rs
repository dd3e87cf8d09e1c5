use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct HelloResponse {
    success: bool,
    message: &'static str,
}

async fn root() -> &'static str {
    "WatchEarn backend is running!"
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/hello - liveness check used by the frontend
async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        success: true,
        message: "Serverless backend working 🚀",
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

pub fn api_router() -> Router {
    Router::new().route("/hello", get(hello))
}
