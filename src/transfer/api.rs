//! HTTP client for the Globus transfer service.
//!
//! Every request carries a bearer token minted through the [`Authorizer`],
//! so a refresh-token authorizer renews transparently as the loop runs.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::auth::{AuthApiError, Authorizer};

use super::types::{
    ActivationDocument, ErrorDocument, FileListDocument, SubmissionId, SubmitResult, TaskDocument,
    TransferRequest,
};

/// Default URL for the transfer service.
pub const TRANSFER_API_URL: &str = "https://transfer.api.globus.org/v0.10";

/// Interval between task status polls inside `task_wait`.
const TASK_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Error type for transfer service operations.
#[derive(Debug)]
pub enum TransferApiError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// JSON deserialization failed
    Json(serde_json::Error),
    /// The service returned an error document
    Api {
        status: u16,
        code: String,
        message: String,
    },
    /// Minting a bearer token failed
    Auth(AuthApiError),
}

impl TransferApiError {
    /// True for 401 responses, which the driver maps to "refresh token expired".
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransferApiError::Api { status: 401, .. })
    }
}

impl std::fmt::Display for TransferApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferApiError::Http(e) => write!(f, "HTTP error: {}", e),
            TransferApiError::Json(e) => write!(f, "JSON error: {}", e),
            TransferApiError::Api {
                status,
                code,
                message,
            } => write!(f, "transfer API error ({} {}): {}", status, code, message),
            TransferApiError::Auth(e) => write!(f, "authorization error: {}", e),
        }
    }
}

impl std::error::Error for TransferApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferApiError::Http(e) => Some(e),
            TransferApiError::Json(e) => Some(e),
            TransferApiError::Auth(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransferApiError {
    fn from(e: reqwest::Error) -> Self {
        TransferApiError::Http(e)
    }
}

impl From<AuthApiError> for TransferApiError {
    fn from(e: AuthApiError) -> Self {
        TransferApiError::Auth(e)
    }
}

/// Result of waiting on a task.
///
/// The wait is bounded; a bounded wait that elapses is not completion, and
/// the two cases are kept distinct so the caller can log them apart.
#[derive(Debug)]
pub enum WaitOutcome {
    /// The task reached a terminal state within the bound.
    Done(TaskDocument),
    /// The bound elapsed with the task still running.
    TimedOut,
}

/// Client for the Globus transfer service.
#[derive(Debug)]
pub struct TransferApiClient {
    /// Base URL for the transfer service
    pub base_url: String,
    /// Reusable HTTP client
    client: Client,
    /// Bearer-token source for every request
    authorizer: Authorizer,
}

impl TransferApiClient {
    /// Create a client against the production transfer service.
    pub fn new(authorizer: Authorizer) -> Self {
        Self::with_base_url(authorizer, TRANSFER_API_URL.to_string())
    }

    /// Create a client against a custom base URL (tests use a mock server).
    pub fn with_base_url(authorizer: Authorizer, base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
            authorizer,
        }
    }

    /// Ask the service to activate an endpoint with cached credentials.
    ///
    /// POST /endpoint/{id}/autoactivate
    pub async fn endpoint_autoactivate(
        &mut self,
        endpoint: &str,
    ) -> Result<ActivationDocument, TransferApiError> {
        let url = format!("{}/endpoint/{}/autoactivate", self.base_url, endpoint);
        self.post_json(url, &serde_json::json!({})).await
    }

    /// List a directory on an endpoint.
    ///
    /// GET /operation/endpoint/{id}/ls
    pub async fn operation_ls(
        &mut self,
        endpoint: &str,
        path: &str,
    ) -> Result<FileListDocument, TransferApiError> {
        let url = format!(
            "{}/operation/endpoint/{}/ls?path={}",
            self.base_url,
            endpoint,
            urlencoding::encode(path)
        );
        self.get_json(url).await
    }

    /// Fetch a one-time submission id for the next transfer.
    ///
    /// GET /submission_id
    pub async fn submission_id(&mut self) -> Result<SubmissionId, TransferApiError> {
        let url = format!("{}/submission_id", self.base_url);
        self.get_json(url).await
    }

    /// Submit a transfer request.
    ///
    /// POST /transfer
    pub async fn submit_transfer(
        &mut self,
        request: &TransferRequest,
    ) -> Result<SubmitResult, TransferApiError> {
        let url = format!("{}/transfer", self.base_url);
        self.post_json(url, request).await
    }

    /// Fetch a task record.
    ///
    /// GET /task/{task_id}
    pub async fn get_task(&mut self, task_id: &str) -> Result<TaskDocument, TransferApiError> {
        let url = format!("{}/task/{}", self.base_url, task_id);
        self.get_json(url).await
    }

    /// Poll a task every five seconds until it reaches a terminal state or
    /// `timeout` elapses, whichever comes first.
    pub async fn task_wait(
        &mut self,
        task_id: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome, TransferApiError> {
        let deadline = Instant::now() + timeout;

        loop {
            let task = self.get_task(task_id).await?;
            if task.status.is_terminal() {
                return Ok(WaitOutcome::Done(task));
            }
            debug!(task_id, status = ?task.status, "task still running");

            let remaining = deadline.duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(WaitOutcome::TimedOut);
            }
            sleep(remaining.min(TASK_POLL_INTERVAL)).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(&mut self, url: String) -> Result<T, TransferApiError> {
        let token = self.authorizer.access_token().await?;
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &mut self,
        url: String,
        body: &B,
    ) -> Result<T, TransferApiError> {
        let token = self.authorizer.access_token().await?;
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransferApiError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // The service attaches an error document with a code and message;
            // fall back to the raw body when it doesn't.
            let doc = serde_json::from_str::<ErrorDocument>(&text).unwrap_or(ErrorDocument {
                code: "UnknownError".to_string(),
                message: text,
                request_id: None,
            });
            return Err(TransferApiError::Api {
                status: status.as_u16(),
                code: doc.code,
                message: doc.message,
            });
        }

        serde_json::from_str(&text).map_err(TransferApiError::Json)
    }
}
