//! Response types for the share provider API.

use serde::Deserialize;
use sharerelay_protocol::FileDescriptor;
use sharerelay_protocol::types::size_repr;

/// `kind` value the provider uses for folders.
pub const FOLDER_KIND: &str = "drive#folder";

/// Public metadata of a share.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShareInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pass_code_token: String,
    /// Provider error code; empty when the share is accessible.
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

/// One entry of a folder listing page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShareEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, deserialize_with = "size_repr::deserialize")]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
}

impl ShareEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == FOLDER_KIND
    }

    /// Converts a leaf entry into a descriptor named `prefix + name`.
    pub fn into_descriptor(self, prefix: &str) -> FileDescriptor {
        FileDescriptor {
            id: self.id,
            name: format!("{prefix}{}", self.name),
            size: self.size,
            mime_type: self.mime_type,
            download_url: String::new(),
        }
    }
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FolderPage {
    #[serde(default)]
    pub files: Vec<ShareEntry>,
    #[serde(default)]
    pub next_page_token: String,
}

impl FolderPage {
    /// Continuation token, if another page follows.
    pub fn next_token(&self) -> Option<&str> {
        if self.next_page_token.is_empty() {
            None
        } else {
            Some(&self.next_page_token)
        }
    }
}

/// File details carrying the candidate download locations.
///
/// Every field is optional; the provider fills whichever shapes apply
/// to the file type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileInfo {
    #[serde(default)]
    pub web_content_link: Option<String>,
    /// Named alternative links, kept in document order.
    #[serde(default)]
    pub links: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub medias: Option<Vec<Media>>,
}

/// A transcoded or original media variant.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub link: Option<MediaLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaLink {
    #[serde(default)]
    pub url: String,
}

/// Envelope of the file-info endpoint (internal).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FileInfoResponse {
    #[serde(default)]
    pub file_info: Option<FileInfo>,
}
