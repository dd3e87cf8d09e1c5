use std::sync::Arc;

use tokio::net::TcpListener;
use watchearn_backend::{logging, routes, AppState, Config, JsonFileStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    logging::init(&config.logging.level);
    tracing::info!("Starting WatchEarn backend");

    if config.uses_default_secret() {
        tracing::warn!("auth.jwt_secret is the built-in default; set WATCHEARN__AUTH__JWT_SECRET");
    }
    tracing::info!(
        require_approval = config.workflow.require_approval,
        issue_tokens = config.workflow.issue_tokens,
        "Workflow policy"
    );

    // Fail at startup rather than on the first request if the document is unreadable
    let store = JsonFileStore::new(&config.store.path);
    let doc = store.load()?;
    tracing::info!(
        users = doc.users.len(),
        approvals = doc.approvals.len(),
        "Using document at {}",
        store.path().display()
    );

    let state = Arc::new(AppState::new(config.clone(), Box::new(store))?);
    let app = routes::app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
