//! The `convert` command.

use playlistsheet_core::ConversionResult;
use playlistsheet_providers::google::ApiEndpoints;
use playlistsheet_server::RateLimitConfig;
use tracing::info;

use crate::backend::{ConversionBackend, DirectBackend, HttpBackend};
use crate::cli::ConvertArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::orchestrator::{ConversionState, Converter};
use crate::session::CredentialStore;

/// Converts a playlist and prints the spreadsheet URL.
pub async fn run(
    args: ConvertArgs,
    config: &ClientConfig,
    store: &CredentialStore,
) -> ClientResult<()> {
    let server_url = args.server.clone().or_else(|| config.server.url.clone());
    let backend = select_backend(server_url, config)?;

    let result = convert_with(backend.as_ref(), store, &args).await?;

    println!(
        "Created spreadsheet with {} videos:",
        result.video_count
    );
    println!("{}", result.spreadsheet_url);

    if args.open {
        info!(url = %result.spreadsheet_url, "opening spreadsheet");
        open::that(&result.spreadsheet_url)
            .map_err(|e| ClientError::Action(format!("failed to open URL: {}", e)))?;
    }
    Ok(())
}

/// Runs one conversion on `backend`, printing progress to stderr.
pub async fn convert_with(
    backend: &dyn ConversionBackend,
    store: &CredentialStore,
    args: &ConvertArgs,
) -> ClientResult<ConversionResult> {
    let progress = |_from: ConversionState, to: ConversionState| {
        if !to.is_terminal() {
            eprintln!("{}", to.description());
        }
    };

    let mut converter = Converter::new(store, backend)
        .with_observer(&progress)
        .with_input(args.playlist.as_str());
    Ok(converter.convert(args.title.as_deref()).await?)
}

fn select_backend(
    server_url: Option<String>,
    config: &ClientConfig,
) -> ClientResult<Box<dyn ConversionBackend>> {
    let timeout = config.server.timeout();
    match server_url {
        Some(url) => {
            info!(%url, "converting through server");
            let backend = HttpBackend::new(url, timeout)
                .map_err(|e| ClientError::Config(format!("invalid server settings: {}", e)))?;
            Ok(Box::new(backend))
        }
        None => {
            let endpoints = ApiEndpoints::default().with_timeout(timeout);
            let backend = DirectBackend::from_endpoints(&endpoints, RateLimitConfig::default())
                .map_err(|e| ClientError::Config(format!("failed to set up Google clients: {}", e)))?;
            Ok(Box::new(backend))
        }
    }
}
