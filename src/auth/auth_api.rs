//! Globus Auth client for the native-app authorization-code flow.
//!
//! This module provides the HTTP client for the identity service: building
//! the authorization URL (with a PKCE challenge), exchanging a pasted
//! authorization code for tokens, and refreshing an access token from a
//! stored refresh token.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Default URL for Globus Auth.
pub const AUTH_API_URL: &str = "https://auth.globus.org";

/// Resource server whose token set drives the transfer API.
pub const TRANSFER_RESOURCE_SERVER: &str = "transfer.api.globus.org";

/// Out-of-band page that shows the user the code to paste back.
const REDIRECT_URI: &str = "https://auth.globus.org/v2/web/auth-code";

/// Scope granting full transfer-API access.
const TRANSFER_SCOPE: &str = "urn:globus:auth:scope:transfer.api.globus.org:all";

/// Error type for Globus Auth client operations.
#[derive(Debug)]
pub enum AuthApiError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// JSON deserialization failed
    Json(serde_json::Error),
    /// Identity service returned an error status
    ServerError { status: u16, message: String },
}

impl std::fmt::Display for AuthApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthApiError::Http(e) => write!(f, "HTTP error: {}", e),
            AuthApiError::Json(e) => write!(f, "JSON error: {}", e),
            AuthApiError::ServerError { status, message } => {
                write!(f, "auth server error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for AuthApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthApiError::Http(e) => Some(e),
            AuthApiError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AuthApiError {
    fn from(e: reqwest::Error) -> Self {
        AuthApiError::Http(e)
    }
}

impl From<serde_json::Error> for AuthApiError {
    fn from(e: serde_json::Error) -> Self {
        AuthApiError::Json(e)
    }
}

/// One token set as issued for a single resource server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub resource_server: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Response from the token endpoint (POST /v2/oauth2/token).
///
/// Globus returns one token set at the top level plus `other_tokens` for any
/// additional resource servers covered by the requested scopes.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(flatten)]
    pub tokens: TokenSet,
    #[serde(default)]
    pub other_tokens: Vec<TokenSet>,
}

impl TokenResponse {
    /// Find the token set issued for a given resource server.
    pub fn by_resource_server(&self, resource_server: &str) -> Option<&TokenSet> {
        std::iter::once(&self.tokens)
            .chain(self.other_tokens.iter())
            .find(|t| t.resource_server.as_deref() == Some(resource_server))
    }
}

/// PKCE code verifier for one authorization attempt.
///
/// The verifier is random per attempt; the S256 challenge derived from it
/// goes into the authorize URL, and the verifier itself is sent with the
/// code exchange.
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Generate a fresh random verifier (64 chars, within the RFC 7636 charset).
    pub fn generate() -> Self {
        Self(format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    /// The S256 challenge: base64url(sha256(verifier)), unpadded.
    pub fn challenge(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Client for the Globus Auth identity service.
#[derive(Debug, Clone)]
pub struct AuthApiClient {
    /// Base URL for the identity service
    pub base_url: String,
    /// Reusable HTTP client
    client: Client,
    /// Native-app client id this process authenticates as
    client_id: String,
}

impl AuthApiClient {
    /// Create a client against the production identity service.
    pub fn new(client_id: &str) -> Self {
        Self::with_base_url(client_id, AUTH_API_URL.to_string())
    }

    /// Create a client against a custom base URL (tests use a mock server).
    pub fn with_base_url(client_id: &str, base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
            client_id: client_id.to_string(),
        }
    }

    /// Build the authorization URL the operator must visit.
    ///
    /// `access_type=offline` asks for a refresh token alongside the access
    /// token, which is what lets later runs skip the interactive step.
    pub fn authorize_url(&self, pkce: &PkceVerifier) -> String {
        format!(
            "{}/v2/oauth2/authorize?client_id={}&redirect_uri={}&scope={}&response_type=code&access_type=offline&code_challenge={}&code_challenge_method=S256",
            self.base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(REDIRECT_URI),
            urlencoding::encode(TRANSFER_SCOPE),
            pkce.challenge(),
        )
    }

    /// Exchange a pasted authorization code for tokens.
    ///
    /// POST /v2/oauth2/token
    pub async fn exchange_code_for_tokens(
        &self,
        auth_code: &str,
        pkce: &PkceVerifier,
    ) -> Result<TokenResponse, AuthApiError> {
        let url = format!("{}/v2/oauth2/token", self.base_url);
        let params = [
            ("grant_type", "authorization_code"),
            ("code", auth_code),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", pkce.as_str()),
            ("redirect_uri", REDIRECT_URI),
        ];

        let response = self.client.post(&url).form(&params).send().await?;
        Self::parse_response(response).await
    }

    /// Mint a new access token from a stored refresh token.
    ///
    /// POST /v2/oauth2/token
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, AuthApiError> {
        let url = format!("{}/v2/oauth2/token", self.base_url);
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];

        let response = self.client.post(&url).form(&params).send().await?;
        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AuthApiError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AuthApiError::ServerError { status, message });
        }

        // Read the text first so a malformed body shows up in the error.
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(AuthApiError::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkce_verifier_shape() {
        let pkce = PkceVerifier::generate();
        assert_eq!(pkce.as_str().len(), 64);
        assert!(pkce
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_pkce_challenge_is_unpadded_base64url() {
        let pkce = PkceVerifier::generate();
        let challenge = pkce.challenge();
        // base64url of a sha256 digest is always 43 chars without padding
        assert_eq!(challenge.len(), 43);
        assert!(!challenge.contains('='));
        assert!(!challenge.contains('+'));
        assert!(!challenge.contains('/'));
    }

    #[test]
    fn test_pkce_verifiers_are_unique() {
        assert_ne!(
            PkceVerifier::generate().as_str(),
            PkceVerifier::generate().as_str()
        );
    }

    #[test]
    fn test_authorize_url_contents() {
        let client = AuthApiClient::new("my client");
        let pkce = PkceVerifier::generate();
        let url = client.authorize_url(&pkce);

        assert!(url.starts_with("https://auth.globus.org/v2/oauth2/authorize?"));
        assert!(url.contains("client_id=my%20client"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&pkce.challenge()));
    }

    #[test]
    fn test_by_resource_server_prefers_matching_set() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "auth-at",
            "resource_server": "auth.globus.org",
            "other_tokens": [{
                "access_token": "transfer-at",
                "refresh_token": "transfer-rt",
                "expires_in": 172800,
                "resource_server": "transfer.api.globus.org",
                "token_type": "Bearer"
            }]
        }))
        .unwrap();

        let transfer = response
            .by_resource_server(TRANSFER_RESOURCE_SERVER)
            .expect("transfer token set");
        assert_eq!(transfer.access_token, "transfer-at");
        assert_eq!(transfer.refresh_token.as_deref(), Some("transfer-rt"));

        assert!(response.by_resource_server("groups.api.globus.org").is_none());
    }

    #[test]
    fn test_top_level_token_set_is_searched() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "transfer-at",
            "resource_server": "transfer.api.globus.org"
        }))
        .unwrap();

        assert_eq!(
            response
                .by_resource_server(TRANSFER_RESOURCE_SERVER)
                .unwrap()
                .access_token,
            "transfer-at"
        );
    }
}
