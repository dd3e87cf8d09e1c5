//! Registration and login routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use watchearn_common::{normalize_email, Role, UserView};

use super::{blocking, present, required};
use crate::error::ApiError;
use crate::workflow::accounts;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: UserView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Subset of the new user echoed back on registration.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub approved: bool,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: RegisteredUser,
}

/// POST /api/login
async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload?;
    let (Some(email), Some(password)) = (required(&req.email), present(&req.password)) else {
        return Err(ApiError::Validation("Email and password are required".to_string()));
    };

    let (email, password) = (email.to_string(), password.to_string());
    let worker = state.clone();
    let user = blocking(move || {
        let snapshot = worker.db.read()?;
        let credentials =
            accounts::check_credentials(&snapshot, &worker.passwords, &email, &password)?;
        worker
            .db
            .transact(|doc| accounts::login(doc, &worker.policy, &email, credentials))
    })
    .await?;

    // Admin routes only accept bearer tokens, so admins always get one.
    let token = if state.config.workflow.issue_tokens || user.role == Role::Admin {
        Some(state.tokens.issue(&user.email, user.role)?)
    } else {
        None
    };

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful",
        user,
        token,
    }))
}

/// POST /api/register
async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(req) = payload?;
    let (Some(name), Some(email), Some(password)) =
        (required(&req.name), required(&req.email), present(&req.password))
    else {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    };

    let (name, email, password) = (name.to_string(), normalize_email(email), password.to_string());
    let worker = state.clone();
    let user = blocking(move || {
        accounts::ensure_available(&worker.db.read()?, &email)?;
        let password_hash = worker.passwords.hash(&password)?;
        worker
            .db
            .transact(|doc| accounts::register(doc, &worker.policy, &name, &email, password_hash))
    })
    .await?;

    let message = if user.approved {
        "Registration successful"
    } else {
        "Registration successful, pending admin approval"
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message,
            user: RegisteredUser {
                name: user.name,
                email: user.email,
                role: user.role,
                approved: user.approved,
            },
        }),
    ))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .with_state(state)
}
