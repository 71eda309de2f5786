//! Wire documents exchanged with the transfer service.

use serde::{Deserialize, Serialize};

/// Sync levels understood by the transfer service.
///
/// The wire format is the service's integer code; `Checksum` (3) skips
/// files whose checksum already matches at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncLevel {
    Exists,
    Size,
    Mtime,
    Checksum,
}

impl SyncLevel {
    fn code(self) -> u8 {
        match self {
            SyncLevel::Exists => 0,
            SyncLevel::Size => 1,
            SyncLevel::Mtime => 2,
            SyncLevel::Checksum => 3,
        }
    }
}

impl Serialize for SyncLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// One source-path to destination-path entry in a transfer request.
#[derive(Debug, Clone, Serialize)]
pub struct TransferItem {
    #[serde(rename = "DATA_TYPE")]
    data_type: &'static str,
    pub source_path: String,
    pub destination_path: String,
    pub recursive: bool,
}

/// A transfer submission (POST /transfer).
#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    #[serde(rename = "DATA_TYPE")]
    data_type: &'static str,
    pub submission_id: String,
    pub source_endpoint: String,
    pub destination_endpoint: String,
    pub label: String,
    pub sync_level: SyncLevel,
    #[serde(rename = "DATA")]
    pub data: Vec<TransferItem>,
}

impl TransferRequest {
    pub fn new(
        submission_id: impl Into<String>,
        source_endpoint: impl Into<String>,
        destination_endpoint: impl Into<String>,
        label: impl Into<String>,
        sync_level: SyncLevel,
    ) -> Self {
        Self {
            data_type: "transfer",
            submission_id: submission_id.into(),
            source_endpoint: source_endpoint.into(),
            destination_endpoint: destination_endpoint.into(),
            label: label.into(),
            sync_level,
            data: Vec::new(),
        }
    }

    pub fn add_item(&mut self, source_path: &str, destination_path: &str, recursive: bool) {
        self.data.push(TransferItem {
            data_type: "transfer_item",
            source_path: source_path.to_string(),
            destination_path: destination_path.to_string(),
            recursive,
        });
    }
}

/// Response from GET /submission_id.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionId {
    pub value: String,
}

/// Response from POST /transfer.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResult {
    pub task_id: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Task lifecycle states reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Active,
    Inactive,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Whether the task has reached a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

/// Task record (GET /task/{task_id}).
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDocument {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub files: Option<u64>,
    #[serde(default)]
    pub files_transferred: Option<u64>,
    #[serde(default)]
    pub bytes_transferred: Option<u64>,
    #[serde(default)]
    pub nice_status: Option<String>,
}

/// Response from POST /endpoint/{id}/autoactivate.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivationDocument {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Directory listing (GET /operation/endpoint/{id}/ls).
#[derive(Debug, Clone, Deserialize)]
pub struct FileListDocument {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(rename = "DATA", default)]
    pub data: Vec<FileEntry>,
}

/// Error document the transfer service attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDocument {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
}
