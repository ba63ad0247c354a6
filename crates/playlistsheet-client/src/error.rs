//! Client error types.

use std::fmt;

use crate::orchestrator::ConversionFailure;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Google sign-in failed or is required.
    Auth(String),
    /// A conversion run ended in failure.
    Conversion(ConversionFailure),
    /// The HTTP server could not be started or stopped with an error.
    Server(String),
    /// IO error.
    Io(std::io::Error),
    /// Action failed (open browser, etc).
    Action(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Auth(msg) => write!(f, "authentication failed: {}", msg),
            Self::Conversion(failure) => write!(f, "{}", failure),
            Self::Server(msg) => write!(f, "server error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Action(msg) => write!(f, "action failed: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Conversion(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ConversionFailure> for ClientError {
    fn from(failure: ConversionFailure) -> Self {
        Self::Conversion(failure)
    }
}

impl From<playlistsheet_providers::ProviderError> for ClientError {
    fn from(err: playlistsheet_providers::ProviderError) -> Self {
        Self::Auth(err.to_string())
    }
}

impl From<playlistsheet_server::ServerError> for ClientError {
    fn from(err: playlistsheet_server::ServerError) -> Self {
        Self::Server(err.to_string())
    }
}
