//! Plan purchases.

use watchearn_common::{Approval, ApprovalKind, Document, Purchase};

use super::{approvals, Policy};
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    /// Appended to the user right away.
    Completed(Purchase),
    /// Waiting on an admin decision of a `plan` approval.
    Pending(Approval),
}

/// Buy `plan_id` for the user at `email`.
pub fn purchase_plan(
    doc: &mut Document,
    policy: &Policy,
    email: &str,
    plan_id: &str,
) -> Result<PurchaseOutcome, ApiError> {
    let user = doc
        .user_mut(email)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    user.ensure_defaults(&policy.admin_email);

    if policy.require_approval {
        let email = user.email.clone();
        let approval = approvals::record(
            doc,
            Approval::new(ApprovalKind::Plan, email).with_plan(plan_id),
        );
        return Ok(PurchaseOutcome::Pending(approval));
    }

    let purchase = Purchase::new(plan_id);
    user.add_purchase(purchase.clone());
    tracing::info!(email = %user.email, plan_id = %plan_id, purchase_id = %purchase.id, "Plan purchased");
    Ok(PurchaseOutcome::Completed(purchase))
}
