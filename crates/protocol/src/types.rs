use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DESTINATION_FOLDER;

/// A single file found in a share, addressed by its provider id.
///
/// `name` is path-qualified: ancestor folder names joined with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, with = "size_repr")]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
    /// Pre-resolved fetch location; skips link resolution when present.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub download_url: String,
}

impl FileDescriptor {
    /// Returns the last path segment of `name`.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Share identity and access token, resolved once per batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareContext {
    pub share_id: String,
    #[serde(default)]
    pub pass_code_token: String,
}

impl ShareContext {
    pub fn new(share_id: impl Into<String>, pass_code_token: impl Into<String>) -> Self {
        Self {
            share_id: share_id.into(),
            pass_code_token: pass_code_token.into(),
        }
    }
}

/// A time-limited, unauthenticated fetch location for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLink {
    pub file_id: String,
    pub url: String,
}

/// Request accepted by the streaming relay call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub credential: String,
    #[serde(default = "default_destination_folder")]
    pub destination_folder: String,
    pub share_id: String,
    #[serde(default)]
    pub pass_code_token: String,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

fn default_destination_folder() -> String {
    DEFAULT_DESTINATION_FOLDER.to_string()
}

impl RelayRequest {
    /// Share context this request operates on.
    pub fn share(&self) -> ShareContext {
        ShareContext::new(&self.share_id, &self.pass_code_token)
    }
}

/// Result of listing a share, as handed to a front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareListing {
    pub share_name: String,
    pub share_id: String,
    #[serde(default)]
    pub pass_code_token: String,
    pub files: Vec<FileDescriptor>,
    pub total: usize,
}

/// File sizes arrive as decimal strings from the share provider and as
/// integers from our own front ends. Both decode; integers are written.
pub mod size_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(size: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(*size)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Int(n) => Ok(n),
            Repr::Text(s) if s.trim().is_empty() => Ok(0),
            Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}
