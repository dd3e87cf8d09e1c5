pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod store;
pub mod test_util;
pub mod workflow;

pub use auth::{AuthUser, Passwords, TokenIssuer};
pub use config::Config;
pub use error::ApiError;
pub use store::{Database, JsonFileStore, MemoryStore, Store, StoreError};
pub use workflow::Policy;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Document access; serializes writers within this process.
    pub db: Database,
    pub tokens: TokenIssuer,
    pub passwords: Passwords,
    pub policy: Policy,
}

impl AppState {
    pub fn new(config: Config, store: Box<dyn Store>) -> Result<Self, auth::AuthError> {
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_days);
        let passwords = Passwords::new(
            config.auth.password_memory_kib,
            config.auth.password_iterations,
        )?;
        let policy = Policy::from_config(&config);

        Ok(Self {
            db: Database::new(store),
            tokens,
            passwords,
            policy,
            config,
        })
    }
}
