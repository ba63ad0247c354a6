//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// playlistsheet - turn a YouTube playlist into a Google Sheet
#[derive(Debug, Parser)]
#[command(name = "playlistsheet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "PLAYLISTSHEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and out
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Convert a playlist into a new spreadsheet
    Convert(ConvertArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run the HTTP server in the foreground
    Serve(ServeArgs),
}

/// Authentication actions.
#[derive(Debug, Subcommand)]
pub enum AuthAction {
    /// Sign in with Google in the browser
    Google {
        /// OAuth client ID (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Path to a Google Cloud Console credentials JSON file
        #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
        credentials_file: Option<PathBuf>,

        /// Sign in again even if the current session is still valid
        #[arg(long, short)]
        force: bool,
    },

    /// Store an access token obtained elsewhere
    Token {
        /// The bearer token
        #[arg(env = "PLAYLISTSHEET_ACCESS_TOKEN", hide_env_values = true)]
        token: String,

        /// Token lifetime in seconds (defaults to google.default_ttl)
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Sign out and forget the stored token
    Logout,

    /// Show whether a valid token is stored
    Status,
}

/// Arguments of `convert`.
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Playlist URL or bare playlist ID
    pub playlist: String,

    /// Spreadsheet title (defaults to "Playlist - <date>")
    #[arg(long, short)]
    pub title: Option<String>,

    /// Open the spreadsheet in the browser when done
    #[arg(long)]
    pub open: bool,

    /// Convert through a running server instead of in-process
    #[arg(long, env = "PLAYLISTSHEET_SERVER")]
    pub server: Option<String>,
}

/// Arguments of `serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "PLAYLISTSHEET_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Requests admitted per caller per window
    #[arg(long, default_value_t = 10)]
    pub max_requests: usize,

    /// Rate limit window in milliseconds
    #[arg(long, default_value_t = 60_000)]
    pub window_ms: u64,

    /// Outbound request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Override the YouTube Data API base URL
    #[arg(long, env = "PLAYLISTSHEET_YOUTUBE_BASE", hide = true)]
    pub youtube_base: Option<String>,

    /// Override the Sheets API base URL
    #[arg(long, env = "PLAYLISTSHEET_SHEETS_BASE", hide = true)]
    pub sheets_base: Option<String>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
