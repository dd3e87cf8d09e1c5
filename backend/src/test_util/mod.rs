//! Helpers shared by unit and integration tests.

use std::sync::Arc;

use watchearn_common::{Document, Role};

use crate::config::Config;
use crate::store::MemoryStore;
use crate::AppState;

pub const TEST_ADMIN_EMAIL: &str = "admin@watchearn.com";

/// Default config with a fixed secret and cheap Argon2 parameters.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "test-secret".to_string();
    config.auth.admin_email = TEST_ADMIN_EMAIL.to_string();
    config.auth.password_memory_kib = 8;
    config.auth.password_iterations = 1;
    config.logging.level = "debug".to_string();
    config
}

/// Config for the approval-gated variant.
pub fn gated_config() -> Config {
    let mut config = test_config();
    config.workflow.require_approval = true;
    config
}

pub fn create_test_state(config: Config) -> Arc<AppState> {
    create_test_state_with(config, Document::default())
}

pub fn create_test_state_with(config: Config, doc: Document) -> Arc<AppState> {
    let state = AppState::new(config, Box::new(MemoryStore::with_document(doc)))
        .expect("test config has valid password parameters");
    Arc::new(state)
}

/// Token for `email` signed with the state's secret.
pub fn token_for(state: &AppState, email: &str, role: Role) -> String {
    state
        .tokens
        .issue(email, role)
        .expect("signing with an HMAC secret cannot fail")
}

pub fn admin_token(state: &AppState) -> String {
    token_for(state, TEST_ADMIN_EMAIL, Role::Admin)
}
