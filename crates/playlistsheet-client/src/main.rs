//! playlistsheet CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use playlistsheet_client::cli::{AuthAction, Cli, Command, ConfigAction};
use playlistsheet_client::commands;
use playlistsheet_client::config::ClientConfig;
use playlistsheet_client::error::{ClientError, ClientResult};
use playlistsheet_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match (&cli.command, cli.debug) {
        (Command::Serve(_), true) => TracingConfig::server().with_level(tracing::Level::DEBUG),
        (Command::Serve(_), false) => TracingConfig::server(),
        (_, true) => TracingConfig::cli_debug(),
        (_, false) => TracingConfig::cli(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };

    match cli.command {
        Command::Auth { action } => {
            let store = config.session.credential_store();
            match action {
                AuthAction::Google {
                    client_id,
                    client_secret,
                    credentials_file,
                    force,
                } => {
                    commands::auth::google(
                        client_id,
                        client_secret,
                        credentials_file,
                        force,
                        &config,
                        &config_path,
                        &store,
                    )
                    .await
                }
                AuthAction::Token { token, ttl } => {
                    commands::auth::token(&token, ttl, &config, &store)
                }
                AuthAction::Logout => commands::auth::logout(&store),
                AuthAction::Status => commands::auth::status(&store),
            }
        }
        Command::Convert(args) => {
            let store = config.session.credential_store();
            commands::convert::run(args, &config, &store).await
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        Command::Serve(args) => commands::server::run(&args).await,
    }
}
