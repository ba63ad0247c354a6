//! The `serve` command: runs the HTTP server in the foreground until
//! Ctrl-C or SIGTERM.

use std::time::Duration;

use playlistsheet_providers::google::ApiEndpoints;
use playlistsheet_server::{ServerConfig, serve, shutdown_signal};
use tracing::info;

use crate::cli::ServeArgs;
use crate::error::ClientResult;

pub async fn run(args: &ServeArgs) -> ClientResult<()> {
    let config = server_config(args);
    info!(addr = %config.bind_addr, "starting server");
    serve(config, shutdown_signal()).await?;
    Ok(())
}

/// Builds the server configuration from command-line arguments.
pub fn server_config(args: &ServeArgs) -> ServerConfig {
    let mut endpoints = ApiEndpoints::default().with_timeout(Duration::from_secs(args.timeout));
    if let Some(ref base) = args.youtube_base {
        endpoints = endpoints.with_youtube_base(base.as_str());
    }
    if let Some(ref base) = args.sheets_base {
        endpoints = endpoints.with_sheets_base(base.as_str());
    }

    ServerConfig::new(args.bind)
        .with_rate_limit(args.max_requests, Duration::from_millis(args.window_ms))
        .with_endpoints(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_reach_the_server_config() {
        let args = ServeArgs {
            bind: "0.0.0.0:8080".parse().unwrap(),
            max_requests: 3,
            window_ms: 1_500,
            timeout: 5,
            youtube_base: Some("http://127.0.0.1:9000/youtube/v3".into()),
            sheets_base: None,
        };

        let config = server_config(&args);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window, Duration::from_millis(1_500));
        assert_eq!(config.endpoints.timeout, Duration::from_secs(5));
        assert_eq!(config.endpoints.youtube_base, "http://127.0.0.1:9000/youtube/v3");
        assert_eq!(config.endpoints.sheets_base, ApiEndpoints::default().sheets_base);
        assert!(config.validate().is_ok());
    }
}
