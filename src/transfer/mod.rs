//! Transfer service client and the submit-and-wait loop.

pub mod api;
pub mod driver;
pub mod types;

pub use api::{TransferApiClient, TransferApiError, WaitOutcome, TRANSFER_API_URL};
pub use driver::{TransferDriver, TransferError};
pub use types::{
    ActivationDocument, FileEntry, FileListDocument, SubmissionId, SubmitResult, SyncLevel,
    TaskDocument, TaskStatus, TransferItem, TransferRequest,
};
