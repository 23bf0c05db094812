//! Collaborator traits of the relay pipeline and their network adapters.
//!
//! The traits return boxed futures so they stay object safe; the pipeline
//! holds them as `&dyn` and tests swap in in-memory mocks.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use sharerelay_dropbox::{CommitInfo, DropboxClient, UploadCursor};
use sharerelay_protocol::{ResolvedLink, ShareContext};
use sharerelay_share::ShareClient;
use tracing::debug;

use crate::error::RelayError;

/// Boxed future returned by the collaborator traits.
pub type RelayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RelayError>> + Send + 'a>>;

/// Body of an opened download.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, RelayError>> + Send>>;

/// An opened download.
pub struct Download {
    /// Length announced by the source, if any.
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

/// Turns a file id into a download URL.
pub trait LinkResolver: Send + Sync {
    /// The returned link has an empty `url` when the file has none usable.
    fn resolve<'a>(
        &'a self,
        share: &'a ShareContext,
        file_id: &'a str,
    ) -> RelayFuture<'a, ResolvedLink>;
}

/// Opens download URLs.
pub trait ByteSource: Send + Sync {
    /// Starts fetching `url`. Non-success statuses are errors.
    fn open<'a>(&'a self, url: &'a str) -> RelayFuture<'a, Download>;
}

/// Destination store operations used by the upload protocol.
///
/// Committing calls return the canonical path chosen by the store.
pub trait DestinationStore: Send + Sync {
    fn upload<'a>(&'a self, path: &'a str, data: Vec<u8>) -> RelayFuture<'a, String>;

    /// Opens a session with its first chunk; returns the session id.
    fn start_session<'a>(&'a self, data: Vec<u8>) -> RelayFuture<'a, String>;

    fn append<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        data: Vec<u8>,
    ) -> RelayFuture<'a, ()>;

    fn finish<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        path: &'a str,
        data: Vec<u8>,
    ) -> RelayFuture<'a, String>;
}

impl LinkResolver for ShareClient {
    fn resolve<'a>(
        &'a self,
        share: &'a ShareContext,
        file_id: &'a str,
    ) -> RelayFuture<'a, ResolvedLink> {
        Box::pin(async move {
            let url = self.download_link(share, file_id).await?;
            Ok(ResolvedLink {
                file_id: file_id.to_string(),
                url,
            })
        })
    }
}

/// Plain HTTP downloader for resolved links.
pub struct HttpSource {
    http: reqwest::Client,
}

impl HttpSource {
    /// `timeout` bounds connecting and every read, not the whole transfer.
    ///
    /// Download hosts expect the same browser identity as the share API,
    /// so pass the share client's `user_agent`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

impl ByteSource for HttpSource {
    fn open<'a>(&'a self, url: &'a str) -> RelayFuture<'a, Download> {
        Box::pin(async move {
            let resp = self.http.get(url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(RelayError::DownloadStatus {
                    status: status.as_u16(),
                });
            }
            let content_length = resp.content_length();
            debug!(status = status.as_u16(), ?content_length, "download opened");

            let body = resp
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()).map_err(RelayError::from));
            Ok(Download {
                content_length,
                body: Box::pin(body),
            })
        })
    }
}

impl DestinationStore for DropboxClient {
    fn upload<'a>(&'a self, path: &'a str, data: Vec<u8>) -> RelayFuture<'a, String> {
        Box::pin(async move {
            let meta = DropboxClient::upload(self, &CommitInfo::add(path), data).await?;
            Ok(committed_path(meta.path_display, path))
        })
    }

    fn start_session<'a>(&'a self, data: Vec<u8>) -> RelayFuture<'a, String> {
        Box::pin(async move { Ok(DropboxClient::start_session(self, data).await?) })
    }

    fn append<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        data: Vec<u8>,
    ) -> RelayFuture<'a, ()> {
        Box::pin(async move {
            let cursor = UploadCursor { session_id, offset };
            Ok(DropboxClient::append(self, cursor, data).await?)
        })
    }

    fn finish<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        path: &'a str,
        data: Vec<u8>,
    ) -> RelayFuture<'a, String> {
        Box::pin(async move {
            let cursor = UploadCursor { session_id, offset };
            let meta = DropboxClient::finish(self, cursor, &CommitInfo::add(path), data).await?;
            Ok(committed_path(meta.path_display, path))
        })
    }
}

/// The store's display path, or the requested one when it sent none.
fn committed_path(path_display: String, requested: &str) -> String {
    if path_display.is_empty() {
        requested.to_string()
    } else {
        path_display
    }
}
