//! Per-file event emission.

use sharerelay_protocol::ProgressEvent;
use tokio::sync::mpsc;

use crate::error::RelayError;

/// Sends the events of one file, stamped with its batch index.
///
/// A closed channel means the consumer is gone; every send then fails
/// with [`RelayError::Cancelled`].
pub struct FileEvents<'a> {
    tx: &'a mpsc::Sender<ProgressEvent>,
    index: usize,
}

impl<'a> FileEvents<'a> {
    pub fn new(tx: &'a mpsc::Sender<ProgressEvent>, index: usize) -> Self {
        Self { tx, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    async fn send(&self, event: ProgressEvent) -> Result<(), RelayError> {
        self.tx.send(event).await.map_err(|_| RelayError::Cancelled)
    }

    pub async fn start(&self, name: &str) -> Result<(), RelayError> {
        self.send(ProgressEvent::Start {
            index: self.index,
            name: name.to_string(),
        })
        .await
    }

    pub async fn downloading(&self, percent: u8) -> Result<(), RelayError> {
        self.send(ProgressEvent::Downloading {
            index: self.index,
            percent,
        })
        .await
    }

    pub async fn uploading(&self, percent: u8) -> Result<(), RelayError> {
        self.send(ProgressEvent::Uploading {
            index: self.index,
            percent,
        })
        .await
    }

    pub async fn done(&self, path: &str) -> Result<(), RelayError> {
        self.send(ProgressEvent::Done {
            index: self.index,
            path: path.to_string(),
        })
        .await
    }

    pub async fn error(&self, detail: String) -> Result<(), RelayError> {
        self.send(ProgressEvent::Error {
            index: self.index,
            detail,
        })
        .await
    }
}
