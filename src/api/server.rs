use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::AppConfig;
use crate::error::{HarvestError, Result};

/// Start the API server and serve until ctrl-c
pub async fn start_api_server(config: AppConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| HarvestError::Validation(format!("bad listen address: {}", e)))?;

    let app_state = AppState::new(config);
    info!(
        tools = app_state.bridge.registry().len(),
        ibm = app_state.bridge.model_enabled(),
        "agent bridge ready"
    );
    let app = create_router(app_state);

    info!("Harvest Q API listening on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
