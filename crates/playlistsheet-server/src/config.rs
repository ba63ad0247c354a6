//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use playlistsheet_providers::google::ApiEndpoints;

use crate::error::{ServerError, ServerResult};
use crate::rate_limit::RateLimitConfig;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    /// Per-caller admission control on the API routes.
    pub rate_limit: RateLimitConfig,

    /// Google API roots and transport timeout.
    pub endpoints: ApiEndpoints,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            rate_limit: RateLimitConfig::default(),
            endpoints: ApiEndpoints::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    /// Builder: set the rate limit ceiling and window.
    pub fn with_rate_limit(mut self, max_requests: usize, window: Duration) -> Self {
        self.rate_limit.max_requests = max_requests;
        self.rate_limit.window = window;
        self
    }

    /// Builder: set the Google API endpoints.
    pub fn with_endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Builder: set the outbound request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.endpoints.timeout = timeout;
        self
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.rate_limit.max_requests == 0 {
            return Err(ServerError::config("rate limit must admit at least one request"));
        }
        if self.rate_limit.window.is_zero() {
            return Err(ServerError::config("rate limit window must be positive"));
        }
        if self.endpoints.timeout.is_zero() {
            return Err(ServerError::config("request timeout must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.endpoints.timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn custom_config() {
        let config = ServerConfig::new("0.0.0.0:8080".parse().unwrap())
            .with_rate_limit(100, Duration::from_secs(10))
            .with_request_timeout(Duration::from_secs(5))
            .with_endpoints(ApiEndpoints::default().with_youtube_base("http://localhost:9000"));

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.endpoints.youtube_base, "http://localhost:9000");
        // with_endpoints replaces the whole struct, timeout included
        assert_eq!(config.endpoints.timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_config() {
        let config = ServerConfig::default().with_rate_limit(0, Duration::from_secs(1));
        assert!(config.validate().is_err());

        let config = ServerConfig::default().with_rate_limit(1, Duration::ZERO);
        assert!(config.validate().is_err());

        let config = ServerConfig::default().with_request_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
