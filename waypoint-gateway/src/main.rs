//! Entry point for the `waypoint-gateway` HTTP server.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use waypoint_gateway::{
    config::GatewayConfig,
    routes::{api_table, create_router},
};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match GatewayConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let table = match api_table() {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "invalid route table");
            std::process::exit(1);
        }
    };
    info!(routes = table.len(), "route table built");

    let app = create_router(Arc::new(table), &config);

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %config.listen_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %config.listen_addr, "waypoint-gateway listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
