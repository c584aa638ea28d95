//! HTTP API over the ENS friend graph.
//!
//! All routes live under `/api/friends` except `/health`. Responses use the
//! `{success, data, message?}` / `{success, error, code?, details?}` envelopes.

pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;
pub mod validation;

pub use config::{Environment, ServerConfig};
pub use error::{ApiError, ErrorKind, ServerError};
pub use routes::{cors_layer, router, with_middleware};
pub use state::AppState;

use ensgraph_core::db::open_db_from_url;
use log::{info, warn};
use tokio::net::TcpListener;

/// Opens the store, binds the listener and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let conn = open_db_from_url(&config.database_url)?;
    let state = AppState::new(conn, config.environment);
    let app = router(state, cors_layer(config.cors_origin.as_deref())?);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(
        "event=server_start module=server status=ok addr={} env={}",
        config.bind_addr(),
        config.environment
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=server_signal module=server status=error error={err}");
    }
}
