//! OAuth 2.0 PKCE sign-in with a loopback redirect.
//!
//! 1. Generate a code verifier, its SHA-256 challenge and a random state
//! 2. Bind a local listener on the first free port in the configured range
//! 3. Open the consent page in the browser
//! 4. Wait for Google to redirect back with `code` and `state`
//! 5. Exchange the code (with the verifier) for an access token
//!
//! Only the access token and its lifetime are kept; sessions are short-lived
//! and nothing is refreshed.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

use super::config::GoogleConfig;
use super::http;

/// PKCE code verifier length in bytes, before base64 encoding.
const CODE_VERIFIER_LENGTH: usize = 32;

/// How long to wait for the browser to come back.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// An access token obtained at sign-in.
#[derive(Clone)]
pub struct GrantedToken {
    pub access_token: String,
    /// Lifetime reported by the token endpoint.
    pub expires_in: Option<u64>,
    pub scopes: Vec<String>,
}

impl GrantedToken {
    /// Lifetime in seconds, or `default` when the endpoint did not report one.
    pub fn ttl_secs(&self, default: u64) -> u64 {
        self.expires_in.unwrap_or(default)
    }
}

impl std::fmt::Debug for GrantedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantedToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// OAuth client for Google sign-in.
#[derive(Debug)]
pub struct OAuthClient {
    config: GoogleConfig,
    http_client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        let http_client = http::build_http_client(
            config.timeout,
            concat!("playlistsheet/", env!("CARGO_PKG_VERSION")),
        )?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Runs the browser flow and returns the granted access token.
    pub async fn authorize(&self) -> ProviderResult<GrantedToken> {
        let pkce = PkceFlow::new();

        let (listener, port) = bind_loopback_server(self.config.loopback_port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);

        let auth_url = pkce.build_auth_url(
            &self.config.auth_url,
            &self.config.credentials.client_id,
            &redirect_uri,
            &self.config.scopes,
        );

        info!("starting OAuth flow, opening browser");
        debug!(%auth_url, "authorization URL");

        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
        }

        let (code, received_state) = tokio::task::spawn_blocking(move || wait_for_callback(listener))
            .await
            .map_err(|e| ProviderError::upstream(format!("callback listener failed: {}", e)))??;

        if received_state != pkce.state {
            return Err(ProviderError::authentication(
                "OAuth state mismatch, possible CSRF attempt",
            ));
        }

        info!("received authorization code, exchanging for a token");
        self.exchange_code(&code, &pkce.verifier, &redirect_uri).await
    }

    /// Exchanges an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> ProviderResult<GrantedToken> {
        let params = [
            ("client_id", self.config.credentials.client_id.as_str()),
            ("client_secret", self.config.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let request = self.http_client.post(&self.config.token_url).form(&params);
        let response = http::send(request, "token exchange").await.map_err(|e| {
            // The token endpoint answers 400 for a bad or reused code.
            ProviderError::authentication(e.message().to_string()).with_source(e)
        })?;
        let token: TokenResponse = http::read_json(response, "token exchange").await?;

        let scopes = match token.scope {
            Some(scope) => scope.split_whitespace().map(String::from).collect(),
            None => self.config.scopes.clone(),
        };

        info!("obtained access token");
        Ok(GrantedToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
            scopes,
        })
    }
}

fn bind_loopback_server(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in port_range.0..=port_range.1 {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            debug!(port, "bound loopback server");
            return Ok((listener, port));
        }
    }
    Err(ProviderError::upstream(format!(
        "no available port in range {}-{}",
        port_range.0, port_range.1
    )))
}

/// Blocks until the redirect arrives or the timeout elapses.
fn wait_for_callback(listener: TcpListener) -> ProviderResult<(String, String)> {
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Some(result) = handle_callback(stream) {
                        let _ = tx.send(result);
                        return;
                    }
                }
                Err(e) => warn!("failed to accept connection: {}", e),
            }
        }
    });

    match rx.recv_timeout(CALLBACK_TIMEOUT) {
        Ok(result) => result,
        Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
            Err(ProviderError::authentication("timed out waiting for sign-in"))
        }
        Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
            Err(ProviderError::upstream("callback listener stopped"))
        }
    }
}

/// Answers one request on the loopback server.
///
/// Returns `None` for requests that are not the callback (favicon and such).
fn handle_callback(mut stream: TcpStream) -> Option<ProviderResult<(String, String)>> {
    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line).ok()?;

    let mut parts = request_line.split_whitespace();
    if parts.next() != Some("GET") {
        return None;
    }
    let result = parse_callback(parts.next()?)?;

    let response = if result.is_ok() {
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
        <html><body><h1>Signed in</h1>\
        <p>You can close this window and return to the terminal.</p></body></html>"
    } else {
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
        <html><body><h1>Sign-in failed</h1>\
        <p>You can close this window.</p></body></html>"
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();

    Some(result)
}

/// Extracts `(code, state)` from a callback request target.
fn parse_callback(target: &str) -> Option<ProviderResult<(String, String)>> {
    let url = Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;
    if url.path() != "/callback" {
        return None;
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(ProviderError::authentication(format!(
            "authorization denied: {}",
            error
        ))));
    }

    Some(match code {
        Some(code) => Ok((code, state.unwrap_or_default())),
        None => Err(ProviderError::authentication(
            "missing authorization code in callback",
        )),
    })
}

/// PKCE state (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    /// SHA-256 of the verifier, base64url encoded.
    pub challenge: String,
    /// CSRF protection.
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the consent page URL.
    pub fn build_auth_url(
        &self,
        auth_url: &str,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&prompt=consent",
            auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::config::{GOOGLE_AUTH_URL, OAuthCredentials, default_scopes};
    use playlistsheet_core::ErrorKind;

    #[test]
    fn pkce_verifier_length() {
        // 32 bytes base64url without padding
        assert_eq!(PkceFlow::new().verifier.len(), 43);
    }

    #[test]
    fn pkce_challenge_is_deterministic() {
        assert_eq!(
            PkceFlow::compute_challenge("test-verifier"),
            PkceFlow::compute_challenge("test-verifier")
        );
    }

    #[test]
    fn pkce_values_are_random() {
        let a = PkceFlow::new();
        let b = PkceFlow::new();
        assert_ne!(a.challenge, b.challenge);
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn auth_url_requests_both_scopes() {
        let flow = PkceFlow::new();
        let url = flow.build_auth_url(
            GOOGLE_AUTH_URL,
            "test-client.apps.googleusercontent.com",
            "http://127.0.0.1:8080/callback",
            &default_scopes(),
        );

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("youtube.readonly"));
        assert!(url.contains("auth%2Fspreadsheets"));
        assert!(url.contains(&format!("state={}", urlencoding::encode(&flow.state))));
    }

    #[test]
    fn callback_with_code_and_state() {
        let (code, state) = parse_callback("/callback?code=4%2Fabc&state=xyz")
            .unwrap()
            .unwrap();
        assert_eq!(code, "4/abc");
        assert_eq!(state, "xyz");
    }

    #[test]
    fn callback_with_error_is_authentication() {
        let err = parse_callback("/callback?error=access_denied")
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(err.message().contains("access_denied"));
    }

    #[test]
    fn callback_without_code() {
        assert!(parse_callback("/callback?state=xyz").unwrap().is_err());
    }

    #[test]
    fn other_paths_are_ignored() {
        assert!(parse_callback("/favicon.ico").is_none());
    }

    #[test]
    fn ttl_falls_back_to_default() {
        let token = GrantedToken {
            access_token: "ya29.secret".into(),
            expires_in: None,
            scopes: vec![],
        };
        assert_eq!(token.ttl_secs(3600), 3600);
        assert!(!format!("{:?}", token).contains("ya29.secret"));
    }

    #[test]
    fn oauth_client_builds() {
        let config = GoogleConfig::new(OAuthCredentials::new(
            "test.apps.googleusercontent.com",
            "secret",
        ));
        assert!(OAuthClient::new(config).is_ok());
    }
}
