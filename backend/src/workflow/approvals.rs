//! Approval recording and the admin decision that propagates to users.

use chrono::{DateTime, Utc};
use watchearn_common::{Approval, ApprovalKind, ApprovalStatus, Document, Purchase};

use crate::error::ApiError;

/// Append a pending approval and return it.
pub fn record(doc: &mut Document, approval: Approval) -> Approval {
    tracing::info!(
        approval_id = %approval.id,
        kind = ?approval.kind,
        email = %approval.email,
        "Recorded approval"
    );
    doc.approvals.push(approval.clone());
    approval
}

/// All approvals, oldest first.
pub fn list(doc: &Document) -> Vec<Approval> {
    doc.approvals.clone()
}

/// Set an approval's status and apply its effect.
///
/// - `signup`: the user's `approved` flag becomes `status == approved`.
/// - `plan`: the first move to `approved` appends the purchase.
/// - `login`: no effect beyond the status.
///
/// A user that no longer exists is skipped without error.
pub fn decide(
    doc: &mut Document,
    id: &str,
    status: ApprovalStatus,
    at: DateTime<Utc>,
) -> Result<Approval, ApiError> {
    let approval = doc
        .approval_mut(id)
        .ok_or_else(|| ApiError::NotFound("Approval not found".to_string()))?;
    approval.set_status(status, at);
    let snapshot = approval.clone();

    match snapshot.kind {
        ApprovalKind::Signup => match doc.user_mut(&snapshot.email) {
            Some(user) => user.approved = status == ApprovalStatus::Approved,
            None => tracing::warn!(email = %snapshot.email, "Signup approval refers to a missing user"),
        },
        ApprovalKind::Plan => {
            if status == ApprovalStatus::Approved && snapshot.purchase_id.is_none() {
                if let Some(purchase_id) = grant_plan(doc, &snapshot) {
                    if let Some(approval) = doc.approval_mut(id) {
                        approval.purchase_id = Some(purchase_id);
                    }
                }
            }
        }
        ApprovalKind::Login => {}
    }

    tracing::info!(approval_id = %id, status = %status, kind = ?snapshot.kind, "Approval decided");

    doc.approval(id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("Approval not found".to_string()))
}

fn grant_plan(doc: &mut Document, approval: &Approval) -> Option<String> {
    let Some(plan_id) = approval.plan_id.as_deref() else {
        tracing::warn!(approval_id = %approval.id, "Plan approval has no planId");
        return None;
    };
    let Some(user) = doc.user_mut(&approval.email) else {
        tracing::warn!(email = %approval.email, "Plan approval refers to a missing user");
        return None;
    };

    let purchase = Purchase::new(plan_id);
    let purchase_id = purchase.id.clone();
    user.add_purchase(purchase);
    tracing::info!(email = %approval.email, plan_id = %plan_id, purchase_id = %purchase_id, "Plan purchased");
    Some(purchase_id)
}
