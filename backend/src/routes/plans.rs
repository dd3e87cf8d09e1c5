//! Plan purchase routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use watchearn_common::{Approval, Purchase};

use super::{blocking, required};
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::workflow::purchases::{self, PurchaseOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub plan_id: Option<String>,
    /// Only read when tokens are disabled and no bearer token is sent.
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub success: bool,
    pub message: &'static str,
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase: Option<Purchase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval: Option<Approval>,
}

/// POST /api/plan and /api/purchase-plan
async fn purchase_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let token_email = match state.tokens.authenticate(&headers) {
        Ok(user) => Some(user.email),
        Err(AuthError::MissingHeader) if !state.config.workflow.issue_tokens => None,
        Err(e) => return Err(e.into()),
    };

    let Json(req) = payload?;
    let plan_id = required(&req.plan_id)
        .ok_or_else(|| ApiError::Validation("planId is required".to_string()))?;

    let email = match token_email {
        Some(email) => email,
        None => required(&req.email)
            .ok_or_else(|| ApiError::Validation("email is required".to_string()))?
            .to_string(),
    };

    let plan_id = plan_id.to_string();
    let (worker, plan) = (state.clone(), plan_id.clone());
    let outcome = blocking(move || {
        worker
            .db
            .transact(|doc| purchases::purchase_plan(doc, &worker.policy, &email, &plan))
    })
    .await?;

    let response = match outcome {
        PurchaseOutcome::Completed(purchase) => PurchaseResponse {
            success: true,
            message: "Plan purchase successful",
            plan_id,
            purchase: Some(purchase),
            approval: None,
        },
        PurchaseOutcome::Pending(approval) => PurchaseResponse {
            success: true,
            message: "Plan purchase pending approval",
            plan_id,
            purchase: None,
            approval: Some(approval),
        },
    };

    Ok(Json(response))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/plan", post(purchase_plan))
        .route("/purchase-plan", post(purchase_plan))
        .with_state(state)
}
