//! CLI, credential store, conversion orchestrator, commands
//!
//! This crate provides the `playlistsheet` command-line interface.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod secret;
pub mod session;

pub use backend::{ConversionBackend, DirectBackend, HttpBackend};
pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use orchestrator::{ConversionFailure, ConversionState, Converter, ProgressObserver};
pub use session::{CredentialStore, FileSession, MemorySession, SessionBackend};
