//! Relay error types.

use sharerelay_protocol::constants::{MAX_ERROR_DETAIL, NO_DOWNLOAD_LINK};

/// Errors produced while relaying a batch.
///
/// Everything except [`Cancelled`](Self::Cancelled) is confined to the
/// file it happened on and reported as that file's `error` event.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Share metadata, listing or file-info call failed.
    #[error("{0}")]
    Share(#[from] sharerelay_share::Error),

    #[error("{}", NO_DOWNLOAD_LINK)]
    NoLink,

    #[error("download failed: HTTP {status}")]
    DownloadStatus { status: u16 },

    #[error("download error: {0}")]
    Http(#[from] reqwest::Error),

    /// Destination rejected a call or answered with an unexpected shape.
    #[error("{0}")]
    Destination(#[from] sharerelay_dropbox::Error),

    #[error("{0}")]
    Transfer(#[from] sharerelay_transfer::TransferError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The event consumer went away.
    #[error("cancelled")]
    Cancelled,
}

impl RelayError {
    /// Message for an `error` event, bounded to the detail limit.
    pub fn detail(&self) -> String {
        truncate_detail(&self.to_string())
    }
}

/// Cuts `text` to at most the detail limit, counted in characters.
pub fn truncate_detail(text: &str) -> String {
    text.chars().take(MAX_ERROR_DETAIL).collect()
}
