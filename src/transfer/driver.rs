//! The submit-and-wait loop.
//!
//! One iteration: verify both folders are listable, submit a recursive
//! checksum-synced transfer, wait (bounded) for the task, sleep, repeat.
//! There is no backoff and no retry count; the first unhandled error ends
//! the run.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, GlobusConfig};

use super::api::{TransferApiClient, TransferApiError, WaitOutcome};
use super::types::{SyncLevel, TransferRequest};

/// Errors ending the transfer loop.
#[derive(Debug, Error)]
pub enum TransferError {
    /// 401 during endpoint activation: the cached refresh token is no
    /// longer accepted and the operator has to log in again.
    #[error(
        "Refresh token has expired. Please delete {} and try again.",
        .refresh_token_file.display()
    )]
    RefreshTokenExpired { refresh_token_file: PathBuf },

    /// A configured folder is not listable on its endpoint.
    #[error("failed to query endpoint \"{endpoint}\": {message}")]
    EndpointCheck { endpoint: String, message: String },

    #[error(transparent)]
    Api(#[from] TransferApiError),
}

/// Owns the transfer client and drives the loop forever.
pub struct TransferDriver {
    client: TransferApiClient,
    globus: GlobusConfig,
    refresh_token_file: PathBuf,
}

impl TransferDriver {
    pub fn new(client: TransferApiClient, config: &Config) -> Self {
        Self {
            client,
            globus: config.globus.clone(),
            refresh_token_file: config.login.refresh_token_file.clone(),
        }
    }

    /// Auto-activate the source and destination endpoints.
    ///
    /// A 401 here means the refresh credential is dead; anything else is
    /// re-raised unchanged.
    pub async fn activate_endpoints(&mut self) -> Result<(), TransferError> {
        let endpoints = [
            self.globus.source_endpoint.clone(),
            self.globus.dest_endpoint.clone(),
        ];
        for endpoint in endpoints {
            match self.client.endpoint_autoactivate(&endpoint).await {
                Ok(activation) => {
                    debug!(
                        endpoint = %endpoint,
                        code = activation.code.as_deref().unwrap_or("-"),
                        "endpoint activated"
                    );
                }
                Err(err) if err.is_unauthorized() => {
                    return Err(TransferError::RefreshTokenExpired {
                        refresh_token_file: self.refresh_token_file.clone(),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Verify a folder is listable, naming the endpoint in the failure.
    async fn check_endpoint(&mut self, endpoint: &str, path: &str) -> Result<(), TransferError> {
        match self.client.operation_ls(endpoint, path).await {
            Ok(_) => Ok(()),
            Err(TransferApiError::Api { message, .. }) => Err(TransferError::EndpointCheck {
                endpoint: endpoint.to_string(),
                message,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// One loop iteration: check both paths, submit, wait, log.
    pub async fn run_once(&mut self) -> Result<(), TransferError> {
        let source_endpoint = self.globus.source_endpoint.clone();
        let dest_endpoint = self.globus.dest_endpoint.clone();
        let source_folder = self.globus.source_folder.clone();
        let dest_folder = self.globus.dest_folder.clone();

        self.check_endpoint(&source_endpoint, &source_folder).await?;
        self.check_endpoint(&dest_endpoint, &dest_folder).await?;

        let submission = self.client.submission_id().await?;
        let mut request = TransferRequest::new(
            submission.value,
            source_endpoint,
            dest_endpoint,
            self.globus.transfer_label.clone(),
            SyncLevel::Checksum,
        );
        request.add_item(&source_folder, &dest_folder, true);

        let submitted = self.client.submit_transfer(&request).await?;
        info!(task_id = %submitted.task_id, "task submitted");

        match self
            .client
            .task_wait(&submitted.task_id, self.globus.poll_time)
            .await?
        {
            WaitOutcome::Done(task) => {
                info!(task_id = %task.task_id, status = ?task.status, "task complete");
                debug!(?task, "final task record");
            }
            WaitOutcome::TimedOut => {
                // Not a completion. The next iteration resubmits with
                // checksum sync, so already-copied files are skipped.
                warn!(
                    task_id = %submitted.task_id,
                    timeout_secs = self.globus.poll_time.as_secs(),
                    "task still running after wait timeout; moving on"
                );
            }
        }

        Ok(())
    }

    /// Run forever: iterate, sleep the poll time, go again.
    pub async fn run(&mut self) -> Result<(), TransferError> {
        loop {
            self.run_once().await?;
            tokio::time::sleep(self.globus.poll_time).await;
        }
    }
}
