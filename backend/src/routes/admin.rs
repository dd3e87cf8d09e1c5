//! Admin API routes.
//!
//! Provides:
//! - Users list with credentials stripped (`/admin/users`)
//! - Approvals list, oldest first (`/admin/approvals`)
//! - Approval decisions (`/admin/approve`)

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use watchearn_common::{Approval, ApprovalStatus, Role, UserView};

use super::{blocking, required};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::workflow::approvals;
use crate::AppState;

/// Middleware that requires an authenticated admin user.
async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let result = state.tokens.authenticate(request.headers()).and_then(|user| {
        user.require_role(Role::Admin)?;
        Ok(user)
    });

    match result {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(path = %request.uri().path(), "Admin access denied: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserView>,
}

#[derive(Debug, Serialize)]
pub struct ApprovalsResponse {
    pub success: bool,
    pub approvals: Vec<Approval>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub success: bool,
    pub approval: Approval,
}

/// GET /admin/users
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<UsersResponse>, ApiError> {
    let worker = state.clone();
    let mut doc = blocking(move || Ok(worker.db.read()?)).await?;
    doc.ensure_defaults(&state.policy.admin_email);

    let users = doc.users.values().map(|user| user.view()).collect();
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

/// GET /admin/approvals
async fn list_approvals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApprovalsResponse>, ApiError> {
    let doc = blocking(move || Ok(state.db.read()?)).await?;
    Ok(Json(ApprovalsResponse {
        success: true,
        approvals: approvals::list(&doc),
    }))
}

/// POST /admin/approve
async fn approve(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    payload: Result<Json<ApproveRequest>, JsonRejection>,
) -> Result<Json<ApproveResponse>, ApiError> {
    let Json(req) = payload?;
    let (Some(id), Some(status)) = (required(&req.id), required(&req.status)) else {
        return Err(ApiError::Validation("id and status are required".to_string()));
    };
    let status: ApprovalStatus = status
        .parse()
        .map_err(|_| ApiError::Validation(format!("Invalid status: {}", status)))?;

    let id = id.to_string();
    let approval = blocking(move || {
        state
            .db
            .transact(|doc| approvals::decide(doc, &id, status, Utc::now()))
    })
    .await?;

    tracing::info!(admin = %admin.email, approval_id = %approval.id, status = %status, "Admin decision applied");
    Ok(Json(ApproveResponse {
        success: true,
        approval,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/approvals", get(list_approvals))
        .route("/approve", post(approve))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}
