//! Destination error types.

/// Longest provider detail kept in an error message.
pub const MAX_DETAIL: usize = 500;

/// Errors produced by the destination client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response; `detail` is the provider's error summary.
    #[error("Dropbox {label} {status}: {detail}")]
    Api {
        label: &'static str,
        status: u16,
        detail: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response was successful but lacked a required field.
    #[error("unexpected Dropbox response: {0}")]
    Protocol(String),

    #[error("missing or malformed access token")]
    InvalidCredential,
}

impl Error {
    /// Status-first rendering used by the account check.
    pub fn status_message(&self) -> String {
        match self {
            Self::Api { status, detail, .. } => format!("HTTP {status}: {detail}"),
            other => other.to_string(),
        }
    }
}

/// Builds the error for a non-success response.
///
/// Detail preference: `error_summary`, then `error[".tag"]`, then the raw
/// body truncated to [`MAX_DETAIL`] characters.
pub fn interpret_error(label: &'static str, status: u16, body: &[u8]) -> Error {
    let parsed = serde_json::from_slice::<serde_json::Value>(body).ok();
    let summary = parsed.as_ref().and_then(|v| {
        v.get("error_summary")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                v.get("error")
                    .and_then(|e| e.get(".tag"))
                    .and_then(serde_json::Value::as_str)
            })
            .map(str::to_string)
    });

    let detail = summary.unwrap_or_else(|| {
        String::from_utf8_lossy(body).chars().take(MAX_DETAIL).collect()
    });

    Error::Api {
        label,
        status,
        detail,
    }
}
