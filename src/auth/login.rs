//! Login flow: cached refresh token, or a one-time interactive authorization.
//!
//! The interactive steps (show the authorization URL, collect the pasted
//! code) live behind [`AuthCodePrompt`] so tests can drive the flow without
//! a console or a browser.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::config::Config;

use super::auth_api::{AuthApiClient, AuthApiError, PkceVerifier, TRANSFER_RESOURCE_SERVER};
use super::authorizer::{AccessTokenAuthorizer, Authorizer, RefreshTokenAuthorizer};

/// How long to let a freshly launched browser settle before prompting.
const BROWSER_SETTLE: Duration = Duration::from_millis(500);

/// Error type for the login flow.
#[derive(Debug)]
pub enum LoginError {
    /// Identity service error
    Api(AuthApiError),
    /// Failed to read the pasted authorization code
    ReadCode(io::Error),
    /// Failed to read the cached refresh-token file
    ReadToken { path: PathBuf, source: io::Error },
    /// Failed to persist the refresh token
    SaveToken { path: PathBuf, source: io::Error },
    /// The token response carried no transfer-API token set
    NoTransferTokens,
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginError::Api(e) => write!(f, "login failed: {}", e),
            LoginError::ReadCode(e) => write!(f, "failed to read authorization code: {}", e),
            LoginError::ReadToken { path, source } => {
                write!(
                    f,
                    "failed to read refresh token file {}: {}",
                    path.display(),
                    source
                )
            }
            LoginError::SaveToken { path, source } => {
                write!(
                    f,
                    "failed to save refresh token to {}: {}",
                    path.display(),
                    source
                )
            }
            LoginError::NoTransferTokens => {
                write!(f, "token response carried no transfer-API tokens")
            }
        }
    }
}

impl std::error::Error for LoginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoginError::Api(e) => Some(e),
            LoginError::ReadCode(e) => Some(e),
            LoginError::ReadToken { source, .. } => Some(source),
            LoginError::SaveToken { source, .. } => Some(source),
            LoginError::NoTransferTokens => None,
        }
    }
}

impl From<AuthApiError> for LoginError {
    fn from(e: AuthApiError) -> Self {
        LoginError::Api(e)
    }
}

/// Interactive capability used when no cached credential exists.
pub trait AuthCodePrompt {
    /// Present the authorization URL to the operator, via a browser when asked.
    fn present_url(&self, url: &str, open_browser: bool);

    /// Block until the operator supplies the pasted authorization code.
    fn read_code(&self) -> io::Result<String>;
}

/// Console implementation: launches the system browser (or prints the URL)
/// and reads the pasted code from stdin.
pub struct ConsolePrompt;

impl AuthCodePrompt for ConsolePrompt {
    fn present_url(&self, url: &str, open_browser: bool) {
        if open_browser && open::that(url).is_ok() {
            std::thread::sleep(BROWSER_SETTLE);
            return;
        }
        println!("Open this URL in your browser:");
        println!("  {}", url);
        println!("Log in and paste the resulting code below.");
    }

    fn read_code(&self) -> io::Result<String> {
        print!("Paste globus response: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Establish an authorizer for this run.
///
/// With a cached refresh token on disk this never prompts and never opens a
/// browser. Otherwise it runs the interactive authorization once, persists
/// the refresh token for future runs, and returns a one-shot authorizer
/// built from the fresh access token.
pub fn connect(
    runtime: &Runtime,
    config: &Config,
    prompt: &dyn AuthCodePrompt,
) -> Result<Authorizer, LoginError> {
    let auth_client = AuthApiClient::new(&config.login.client_id);
    connect_with_client(runtime, config, prompt, auth_client)
}

/// Same flow against an injected auth client (tests point this at a mock
/// identity service).
pub fn connect_with_client(
    runtime: &Runtime,
    config: &Config,
    prompt: &dyn AuthCodePrompt,
    auth_client: AuthApiClient,
) -> Result<Authorizer, LoginError> {
    let token_file = &config.login.refresh_token_file;

    if token_file.exists() {
        let contents = fs::read_to_string(token_file).map_err(|source| LoginError::ReadToken {
            path: token_file.clone(),
            source,
        })?;
        // First line only; anything after it is ignored.
        let token = contents.lines().next().unwrap_or("").trim().to_string();
        debug!(path = %token_file.display(), "using cached refresh token");
        return Ok(Authorizer::RefreshToken(RefreshTokenAuthorizer::new(
            token,
            auth_client,
        )));
    }

    let pkce = PkceVerifier::generate();
    let url = auth_client.authorize_url(&pkce);
    prompt.present_url(&url, config.login.browser);
    let code = prompt.read_code().map_err(LoginError::ReadCode)?;

    let tokens = runtime.block_on(auth_client.exchange_code_for_tokens(&code, &pkce))?;
    let transfer_tokens = tokens
        .by_resource_server(TRANSFER_RESOURCE_SERVER)
        .ok_or(LoginError::NoTransferTokens)?;

    match transfer_tokens.refresh_token.as_deref() {
        Some(refresh) => {
            fs::write(token_file, format!("{refresh}\n")).map_err(|source| {
                LoginError::SaveToken {
                    path: token_file.clone(),
                    source,
                }
            })?;
            info!(path = %token_file.display(), "saved refresh token");
        }
        None => {
            // The service granted no refresh token; the next run will have
            // to go through the interactive flow again.
            warn!("no refresh token in response; skipping token cache");
        }
    }

    Ok(Authorizer::AccessToken(AccessTokenAuthorizer::new(
        transfer_tokens.access_token.clone(),
    )))
}
