//! HTTP server: rate limiting, request validation, playlist and sheet endpoints.
//!
//! The server exposes two JSON endpoints that front the Google APIs on
//! behalf of a caller holding an OAuth access token:
//! - `POST /api/youtube/playlist` returns every video in a playlist
//! - `POST /api/sheets/create` writes videos into a new formatted spreadsheet
//!
//! Both sit behind a per-caller sliding-window rate limiter. `GET /health`
//! is always available.
//!
//! # Example
//!
//! ```rust,no_run
//! use playlistsheet_server::{ServerConfig, serve, shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     serve(config, shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod handler;
mod rate_limit;
mod response;
mod router;

use std::future::Future;
use std::net::SocketAddr;

use playlistsheet_providers::google::GoogleServices;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use config::{DEFAULT_PORT, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::{AppState, create_sheet, fetch_playlist, health};
pub use rate_limit::{
    ANONYMOUS, RateLimitConfig, RateLimiter, caller_identity, rate_limit_middleware,
};
pub use response::ApiError;
pub use router::build_router;

/// Runs the server until `shutdown` resolves.
pub async fn serve(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> ServerResult<()> {
    config.validate()?;

    let services = GoogleServices::new(&config.endpoints)?;
    let state = AppState::new(config.rate_limit.clone(), services);
    let router = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| ServerError::bind(config.bind_addr, e))?;
    let local_addr = listener.local_addr()?;

    info!(
        addr = %local_addr,
        max_requests = config.rate_limit.max_requests,
        window_ms = config.rate_limit.window.as_millis() as u64,
        "listening"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
///
/// A handler that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
