use serde::{Deserialize, Serialize};

/// One record of the relay progress stream.
///
/// Serialized as a single JSON object per line, tagged by `type`.
/// Per file the order is `start`, any number of `downloading`, any number
/// of `uploading`, then exactly one of `done` / `error`. A batch ends with
/// one `complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Start { index: usize, name: String },
    Downloading { index: usize, percent: u8 },
    Uploading { index: usize, percent: u8 },
    Done { index: usize, path: String },
    Error { index: usize, detail: String },
    Complete { ok: usize, total: usize },
}

/// Errors decoding a progress line.
#[derive(Debug, thiserror::Error)]
pub enum EventLineError {
    #[error("empty event line")]
    Empty,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProgressEvent {
    /// Batch position of the file this event belongs to (`None` for `complete`).
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Start { index, .. }
            | Self::Downloading { index, .. }
            | Self::Uploading { index, .. }
            | Self::Done { index, .. }
            | Self::Error { index, .. } => Some(*index),
            Self::Complete { .. } => None,
        }
    }

    /// Returns `true` for the events that close a file (`done`, `error`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Percent carried by `downloading` / `uploading`.
    pub fn percent(&self) -> Option<u8> {
        match self {
            Self::Downloading { percent, .. } | Self::Uploading { percent, .. } => Some(*percent),
            _ => None,
        }
    }

    /// Encodes the event as one newline-terminated JSON line.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Decodes one line produced by [`to_line`](Self::to_line).
    pub fn from_line(line: &str) -> Result<Self, EventLineError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(EventLineError::Empty);
        }
        Ok(serde_json::from_str(trimmed)?)
    }
}
