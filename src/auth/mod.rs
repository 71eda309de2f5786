//! Authentication against Globus Auth.
//!
//! `connect` yields an [`Authorizer`] the transfer client uses to mint
//! bearer tokens: either a self-renewing one built from a cached refresh
//! token, or a one-shot one from a fresh interactive login.

pub mod auth_api;
pub mod authorizer;
pub mod login;

pub use auth_api::{
    AuthApiClient, AuthApiError, PkceVerifier, TokenResponse, TokenSet, AUTH_API_URL,
    TRANSFER_RESOURCE_SERVER,
};
pub use authorizer::{AccessTokenAuthorizer, Authorizer, RefreshTokenAuthorizer};
pub use login::{connect, connect_with_client, AuthCodePrompt, ConsolePrompt, LoginError};
