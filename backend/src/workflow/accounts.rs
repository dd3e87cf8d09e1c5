//! Registration and login.
//!
//! Argon2 runs outside [`crate::Database::transact`]: credentials are hashed
//! or checked first, and the functions taking `&mut Document` only apply the
//! result after re-checking what may have changed in between.

use watchearn_common::{normalize_email, Approval, ApprovalKind, Document, Role, User, UserView};

use super::{approvals, Policy};
use crate::auth::Passwords;
use crate::error::ApiError;

/// Fails with `Conflict` if `email` is already registered.
pub fn ensure_available(doc: &Document, email: &str) -> Result<(), ApiError> {
    if doc.contains_user(email) {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }
    Ok(())
}

/// Create a user from an already computed password hash. Under approval
/// gating the user starts unapproved and a `signup` approval is recorded;
/// the admin address is exempt.
pub fn register(
    doc: &mut Document,
    policy: &Policy,
    name: &str,
    email: &str,
    password_hash: String,
) -> Result<UserView, ApiError> {
    let email = normalize_email(email);
    ensure_available(doc, &email)?;

    let role = Role::for_email(&email, &policy.admin_email);
    let approved = !policy.require_approval || role == Role::Admin;

    let user = User::new(name.trim(), &email, password_hash, role, approved);
    let view = user.view();
    doc.insert_user(user);

    if !approved {
        approvals::record(
            doc,
            Approval::new(ApprovalKind::Signup, email.clone()).with_name(name.trim()),
        );
    }

    tracing::info!(email = %email, role = %role, approved, "User registered");
    Ok(view)
}

/// Result of a successful credential check.
#[derive(Debug)]
pub enum Credentials {
    /// Matched the stored Argon2 hash.
    Verified,
    /// Matched a legacy plaintext password. Carries its replacement hash.
    Upgraded(String),
}

/// Check a password against a snapshot of the document.
pub fn check_credentials(
    doc: &Document,
    passwords: &Passwords,
    email: &str,
    password: &str,
) -> Result<Credentials, ApiError> {
    let Some(user) = doc.user(email) else {
        tracing::info!(email = %normalize_email(email), "Login failed: unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if let Some(hash) = user.password_hash.as_deref() {
        if passwords.verify(password, hash) {
            return Ok(Credentials::Verified);
        }
    } else if user.password.as_deref() == Some(password) {
        return Ok(Credentials::Upgraded(passwords.hash(password)?));
    }

    tracing::info!(email = %user.email, "Login failed: wrong password");
    Err(ApiError::InvalidCredentials)
}

/// Apply a successful login and return the user with credentials stripped.
///
/// The user may have been removed since the check, which fails as
/// `InvalidCredentials`. A replacement hash is only stored if no other
/// login upgraded the record first.
pub fn login(
    doc: &mut Document,
    policy: &Policy,
    email: &str,
    credentials: Credentials,
) -> Result<UserView, ApiError> {
    let Some(user) = doc.user_mut(email) else {
        tracing::info!(email = %normalize_email(email), "Login failed: user removed");
        return Err(ApiError::InvalidCredentials);
    };

    if let Credentials::Upgraded(hash) = credentials {
        if user.password_hash.is_none() {
            user.password_hash = Some(hash);
            tracing::info!(email = %user.email, "Upgraded legacy plaintext password");
        }
    }

    user.password = None;
    user.ensure_defaults(&policy.admin_email);

    let view = user.view();
    if policy.require_approval {
        approvals::record(doc, Approval::new(ApprovalKind::Login, view.email.clone()));
    }

    tracing::info!(email = %view.email, role = %view.role, "Login successful");
    Ok(view)
}
