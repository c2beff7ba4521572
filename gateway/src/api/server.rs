//! HTTP listener
//!
//! Binds the configured address and serves the router until ctrl-c.

use tokio::net::TcpListener;
use tracing::{info, warn};

use super::{router, AppState};
use crate::config::GatewayConfig;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("CLIENT_URL is not a valid origin: {0}")]
    InvalidOrigin(String),
}

pub async fn serve(config: GatewayConfig) -> Result<(), ServeError> {
    let addr = config.socket_addr();
    let client_url = config.client_url.clone();

    let state = AppState::new(config)?;
    let app = router(state)?;

    let listener = TcpListener::bind(addr).await?;
    info!("Gateway listening on {} (client origin {})", addr, client_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
