//! Domain operations over the document: accounts, approvals and purchases.
//!
//! Each operation takes `&mut Document` and is run inside
//! [`crate::store::Database::transact`]. None of them know about HTTP.

pub mod accounts;
pub mod approvals;
pub mod purchases;

use crate::config::Config;

/// Variant switches and the admin address, resolved once from config.
#[derive(Debug, Clone)]
pub struct Policy {
    pub require_approval: bool,
    pub admin_email: String,
}

impl Policy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            require_approval: config.workflow.require_approval,
            admin_email: config.auth.admin_email.clone(),
        }
    }

    pub fn immediate(admin_email: impl Into<String>) -> Self {
        Self {
            require_approval: false,
            admin_email: admin_email.into(),
        }
    }

    pub fn gated(admin_email: impl Into<String>) -> Self {
        Self {
            require_approval: true,
            admin_email: admin_email.into(),
        }
    }
}
