//! Relay configuration and batch results.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sharerelay_protocol::constants::{
    DEFAULT_DESTINATION_FOLDER, DEFAULT_DOWNLOAD_CHUNK_SIZE, DEFAULT_UPLOAD_CHUNK_SIZE,
    DEFAULT_UPLOAD_THRESHOLD,
};

/// Tunables of one relay run. Immutable once a batch starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Payloads up to this many bytes use a single upload request.
    pub upload_threshold: u64,
    /// Chunk size of upload sessions.
    pub upload_chunk_size: usize,
    /// Minimum bytes between two `downloading` events.
    pub download_chunk_size: usize,
    /// Connect and read timeout for downloads.
    pub download_timeout: Duration,
    pub default_folder: String,
    /// Capacity of the event channel between pipeline and writer.
    pub event_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upload_threshold: DEFAULT_UPLOAD_THRESHOLD,
            upload_chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
            download_chunk_size: DEFAULT_DOWNLOAD_CHUNK_SIZE,
            download_timeout: Duration::from_secs(30),
            default_folder: DEFAULT_DESTINATION_FOLDER.to_string(),
            event_buffer: 64,
        }
    }
}

/// What happened to one file of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    pub index: usize,
    pub name: String,
    /// Destination path on success.
    pub path: Option<String>,
    /// Error detail on failure.
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.path.is_some()
    }
}

/// Result of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub ok: usize,
    pub failed: usize,
    pub total: usize,
    /// Set when the consumer went away before every file ran.
    pub cancelled: bool,
    pub outcomes: Vec<FileOutcome>,
}
