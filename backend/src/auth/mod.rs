//! Authentication: password hashing, token issuance and bearer validation.

mod password;
mod token;

pub use password::Passwords;
pub use token::TokenIssuer;

use watchearn_common::Role;

/// Authenticated caller extracted from a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with [`AuthError::Forbidden`] unless the caller holds `role`.
    pub fn require_role(&self, role: Role) -> Result<(), AuthError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header format")]
    InvalidFormat,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Insufficient role")]
    Forbidden,
    #[error("Password hashing failed")]
    PasswordHash,
    #[error("Token signing failed: {0}")]
    Token(String),
}
