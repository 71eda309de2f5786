//! Bearer-token authorizers for the transfer client.
//!
//! Two variants, matching the two login outcomes: a one-shot access token
//! from a fresh interactive login, and a self-renewing authorizer that
//! mints short-lived access tokens from a cached refresh token.

use chrono::Utc;

use super::auth_api::{AuthApiClient, AuthApiError};

/// Renew this many seconds before the cached access token expires.
const RENEW_MARGIN_SECS: i64 = 30;

/// Source of bearer tokens for transfer-API requests.
#[derive(Debug)]
pub enum Authorizer {
    /// One-shot token from an interactive login; never renewed.
    AccessToken(AccessTokenAuthorizer),
    /// Self-renewing, backed by a cached refresh token.
    RefreshToken(RefreshTokenAuthorizer),
}

impl Authorizer {
    /// A currently-valid access token, renewing first if needed.
    pub async fn access_token(&mut self) -> Result<String, AuthApiError> {
        match self {
            Authorizer::AccessToken(a) => Ok(a.token().to_string()),
            Authorizer::RefreshToken(a) => a.access_token().await,
        }
    }
}

/// Wraps a single access token for the lifetime of one run.
#[derive(Debug)]
pub struct AccessTokenAuthorizer {
    token: String,
}

impl AccessTokenAuthorizer {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    /// Unix timestamp after which the token is no longer usable.
    expires_at: i64,
}

/// Mints access tokens from a long-lived refresh token, caching each one
/// until shortly before its expiry.
#[derive(Debug)]
pub struct RefreshTokenAuthorizer {
    refresh_token: String,
    auth_client: AuthApiClient,
    cached: Option<CachedToken>,
}

impl RefreshTokenAuthorizer {
    pub fn new(refresh_token: impl Into<String>, auth_client: AuthApiClient) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            auth_client,
            cached: None,
        }
    }

    /// Return the cached access token, or mint a new one when the cache is
    /// empty or inside the renewal margin.
    pub async fn access_token(&mut self) -> Result<String, AuthApiError> {
        if let Some(cached) = &self.cached {
            if Utc::now().timestamp() < cached.expires_at - RENEW_MARGIN_SECS {
                return Ok(cached.access_token.clone());
            }
        }

        let tokens = self
            .auth_client
            .refresh_access_token(&self.refresh_token)
            .await?;
        let expires_at = Utc::now().timestamp() + tokens.expires_in.unwrap_or(0) as i64;
        let token = tokens.access_token.clone();
        self.cached = Some(CachedToken {
            access_token: tokens.access_token,
            expires_at,
        });
        Ok(token)
    }

    #[cfg(test)]
    fn with_cached(mut self, access_token: &str, expires_at: i64) -> Self {
        self.cached = Some(CachedToken {
            access_token: access_token.to_string(),
            expires_at,
        });
        self
    }
}
