//! The single JSON document every request reads and rewrites.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::approval::Approval;
use crate::user::{normalize_email, User};

/// Whole persisted state: users keyed by normalized email, approvals oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub users: BTreeMap<String, User>,
    #[serde(default)]
    pub approvals: Vec<Approval>,
}

impl Document {
    pub fn user(&self, email: &str) -> Option<&User> {
        self.users.get(&normalize_email(email))
    }

    pub fn user_mut(&mut self, email: &str) -> Option<&mut User> {
        self.users.get_mut(&normalize_email(email))
    }

    pub fn contains_user(&self, email: &str) -> bool {
        self.users.contains_key(&normalize_email(email))
    }

    /// Insert under the user's normalized email.
    pub fn insert_user(&mut self, user: User) {
        self.users.insert(normalize_email(&user.email), user);
    }

    pub fn approval(&self, id: &str) -> Option<&Approval> {
        self.approvals.iter().find(|a| a.id == id)
    }

    pub fn approval_mut(&mut self, id: &str) -> Option<&mut Approval> {
        self.approvals.iter_mut().find(|a| a.id == id)
    }

    /// Apply [`User::ensure_defaults`] to every user. Returns true if any changed.
    pub fn ensure_defaults(&mut self, admin_email: &str) -> bool {
        let mut changed = false;
        for user in self.users.values_mut() {
            changed |= user.ensure_defaults(admin_email);
        }
        changed
    }
}
