use crate::commands::Backend;
use crate::config::Config;
use crate::error::{ChatError, Result};
use crate::server::{self, AppState};
use std::net::SocketAddr;

/// Run the HTTP API until interrupted
pub async fn run_serve(config: Config, bind: Option<String>, ephemeral: bool) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| ChatError::Config(format!("Invalid bind address '{}': {}", bind, e)))?;

    let Backend { service, files } = Backend::from_config(&config, ephemeral)?;
    tracing::info!("Serving providers: {}", service.providers().join(", "));

    server::serve(AppState { service, files }, addr).await
}
