//! User and purchase records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalize an email into the key users are stored under.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account role. Only the configured admin address is ever given `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Role for a newly seen email given the configured admin address.
    pub fn for_email(email: &str, admin_email: &str) -> Self {
        if normalize_email(email) == normalize_email(admin_email) {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchased plan. Never mutated once appended to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub plan_id: String,
    pub purchased_at: DateTime<Utc>,
}

impl Purchase {
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            plan_id: plan_id.into(),
            purchased_at: Utc::now(),
        }
    }
}

fn default_approved() -> bool {
    // Records written before approval gating existed were usable immediately.
    true
}

/// Stored user record, keyed by normalized email in [`crate::Document`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    /// Argon2 PHC string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Plaintext password left by older deployments. Cleared on the next
    /// successful login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default = "default_approved")]
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    /// Hand-seeded records may lack it; they get the load time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: &str,
        password_hash: String,
        role: Role,
        approved: bool,
    ) -> Self {
        Self {
            name: name.into(),
            email: normalize_email(email),
            password_hash: Some(password_hash),
            password: None,
            role: Some(role),
            approved,
            plan_id: None,
            purchases: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Effective role. Records missing one are treated as plain users until
    /// [`User::ensure_defaults`] fills it in.
    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::User)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    /// Fill in fields older records may lack. Returns true if anything changed.
    pub fn ensure_defaults(&mut self, admin_email: &str) -> bool {
        if self.role.is_some() {
            return false;
        }
        self.role = Some(Role::for_email(&self.email, admin_email));
        true
    }

    /// Record a purchase and make it the active plan.
    pub fn add_purchase(&mut self, purchase: Purchase) {
        self.plan_id = Some(purchase.plan_id.clone());
        self.purchases.push(purchase);
    }

    /// Public projection with credentials stripped.
    pub fn view(&self) -> UserView {
        UserView {
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role(),
            approved: self.approved,
            plan_id: self.plan_id.clone(),
            purchases: self.purchases.clone(),
            created_at: self.created_at,
        }
    }
}

/// User as returned over the API. Has no credential fields at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub purchases: Vec<Purchase>,
    pub created_at: DateTime<Utc>,
}
