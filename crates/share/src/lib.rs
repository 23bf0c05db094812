//! Client for a public share provider.
//!
//! Looks up share metadata, walks a share's folder tree into a flat list
//! of [`FileDescriptor`](sharerelay_protocol::FileDescriptor)s and resolves
//! file ids into time-limited download locations.

pub mod client;
pub mod link;
pub mod lister;
pub mod types;

pub use client::{Error, ShareClient, ShareConfig, extract_share_id};
pub use link::{LinkSource, resolve_link};
pub use lister::{FolderPager, PageFuture, list_tree};
pub use types::{FileInfo, FolderPage, ShareEntry, ShareInfo};
