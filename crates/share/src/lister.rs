//! Share tree listing.
//!
//! Flattens a share's folder hierarchy into an ordered list of file
//! descriptors. Traversal is depth-first in discovery order: a folder's
//! contents are spliced in at the position the folder was found, before
//! the rest of its parent's entries (and pages).
//!
//! Folders are tracked on an explicit stack instead of recursing, so deep
//! trees cost heap, not call stack.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use sharerelay_protocol::{FileDescriptor, ShareContext};
use tracing::debug;

use crate::client::Error;
use crate::types::{FolderPage, ShareEntry};

/// Future returned by [`FolderPager::list_page`].
pub type PageFuture<'a> = Pin<Box<dyn Future<Output = Result<FolderPage, Error>> + Send + 'a>>;

/// Source of folder listing pages.
///
/// Implemented by [`ShareClient`](crate::ShareClient); tests provide
/// in-memory trees.
pub trait FolderPager: Send + Sync {
    /// Fetches one page of `parent_id`'s children (`""` is the share root).
    fn list_page<'a>(
        &'a self,
        share: &'a ShareContext,
        parent_id: &'a str,
        page_token: Option<&'a str>,
    ) -> PageFuture<'a>;
}

/// A folder whose pages are still being consumed.
struct Frame {
    folder_id: String,
    prefix: String,
    pending: VecDeque<ShareEntry>,
    next_page: Option<String>,
    fetched: bool,
}

impl Frame {
    fn new(folder_id: String, prefix: String) -> Self {
        Self {
            folder_id,
            prefix,
            pending: VecDeque::new(),
            next_page: None,
            fetched: false,
        }
    }

    fn has_more_pages(&self) -> bool {
        !self.fetched || self.next_page.is_some()
    }
}

/// Lists every file below `folder_id`, names prefixed with `prefix`.
///
/// Any page failure aborts the whole listing; no partial result is returned.
pub async fn list_tree(
    pager: &dyn FolderPager,
    share: &ShareContext,
    folder_id: &str,
    prefix: &str,
) -> Result<Vec<FileDescriptor>, Error> {
    let mut files = Vec::new();
    let mut pages = 0usize;
    let mut stack = vec![Frame::new(folder_id.to_string(), prefix.to_string())];

    while let Some(frame) = stack.last_mut() {
        if let Some(entry) = frame.pending.pop_front() {
            if entry.is_folder() {
                let child_prefix = format!("{}{}/", frame.prefix, entry.name);
                stack.push(Frame::new(entry.id, child_prefix));
            } else {
                files.push(entry.into_descriptor(&frame.prefix));
            }
            continue;
        }

        if frame.has_more_pages() {
            let token = frame.next_page.take();
            let page = pager
                .list_page(share, &frame.folder_id, token.as_deref())
                .await?;
            pages += 1;
            debug!(
                folder = %frame.folder_id,
                entries = page.files.len(),
                more = page.next_token().is_some(),
                "listed page"
            );
            frame.fetched = true;
            frame.next_page = page.next_token().map(str::to_string);
            frame.pending.extend(page.files);
            continue;
        }

        stack.pop();
    }

    debug!(
        share = %share.share_id,
        files = files.len(),
        pages,
        "listing complete"
    );
    Ok(files)
}
