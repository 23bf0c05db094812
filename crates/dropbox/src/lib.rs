//! Destination store client.
//!
//! Thin async wrapper over the Dropbox v2 HTTP API: the account identity
//! check, single-request uploads and the start/append/finish upload
//! session calls used for large payloads.

pub mod arg;
pub mod client;
pub mod error;

pub use arg::{CommitInfo, UploadCursor, header_arg};
pub use client::{Account, DropboxClient, DropboxConfig, FileMetadata};
pub use error::{Error, interpret_error};
