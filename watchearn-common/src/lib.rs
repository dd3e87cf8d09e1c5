//! WatchEarn Common Types
//!
//! The persisted schema shared by the backend and any tooling that reads the
//! JSON document directly.

pub mod approval;
pub mod document;
pub mod user;

pub use approval::{Approval, ApprovalKind, ApprovalStatus, ParseStatusError};
pub use document::Document;
pub use user::{normalize_email, Purchase, Role, User, UserView};
