//! Share provider API client.
//!
//! Async HTTP client using `reqwest`. Every request carries the browser-like
//! identification headers the provider expects plus a device id derived
//! from the share id.

use std::time::Duration;

use md5::{Digest, Md5};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use serde::de::DeserializeOwned;
use sharerelay_protocol::{FileDescriptor, ShareContext};
use tracing::debug;

use crate::link::resolve_link;
use crate::lister::{FolderPager, PageFuture, list_tree};
use crate::types::{FileInfo, FileInfoResponse, FolderPage, ShareInfo};

const DEFAULT_API_BASE: &str = "https://api-drive.mypikpak.net";
const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
);
const DEFAULT_CLIENT_ID: &str = "YNxT9w7GMdWvEOKa";
const DEFAULT_WEB_ORIGIN: &str = "https://mypikpak.com";

const CLIENT_ID_HEADER: &str = "x-client-id";
const DEVICE_ID_HEADER: &str = "x-device-id";

/// Longest response body kept in an [`Error::Api`].
const MAX_BODY_IN_ERROR: usize = 500;

/// Errors from the share provider client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("share error {code}: {description}")]
    Provider { code: String, description: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

/// Connection settings for the share provider.
#[derive(Debug, Clone)]
pub struct ShareConfig {
    pub api_base: String,
    pub user_agent: String,
    pub client_id: String,
    /// Web origin sent as `Origin` and (with a trailing `/`) as `Referer`.
    pub web_origin: String,
    /// Timeout applied to every metadata and listing request.
    pub timeout: Duration,
    /// Entries requested per listing page.
    pub page_limit: u32,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            web_origin: DEFAULT_WEB_ORIGIN.to_string(),
            timeout: Duration::from_secs(15),
            page_limit: 100,
        }
    }
}

/// Share provider API client.
pub struct ShareClient {
    http: reqwest::Client,
    config: ShareConfig,
}

impl ShareClient {
    /// Creates a client with the given settings.
    pub fn new(config: ShareConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(REFERER, header_value(&format!("{}/", config.web_origin))?);
        headers.insert(ORIGIN, header_value(&config.web_origin)?);
        headers.insert(CLIENT_ID_HEADER, header_value(&config.client_id)?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// Returns the active settings.
    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// Performs a GET against the provider and decodes the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        share_id: &str,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = format!("{}{}", self.config.api_base, endpoint);
        let resp = self
            .http
            .get(&url)
            .header(DEVICE_ID_HEADER, device_id(share_id))
            .query(params)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "share API response");

        if !status.is_success() {
            return Err(provider_error(status.as_u16(), &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetches a share's public metadata.
    ///
    /// Provider-level errors are returned inside [`ShareInfo::error`].
    pub async fn share_info(&self, share_id: &str) -> Result<ShareInfo, Error> {
        self.get(
            share_id,
            "/drive/v1/share",
            &[("share_id", share_id), ("thumbnail_size", "SIZE_LARGE")],
        )
        .await
    }

    /// Opens a share: fetches its metadata and fails on provider errors.
    ///
    /// Returns the batch context together with the share title.
    pub async fn open_share(&self, share_id: &str) -> Result<(ShareContext, String), Error> {
        let info = self.share_info(share_id).await?;
        if !info.error.is_empty() {
            let description = if info.error_description.is_empty() {
                info.error.clone()
            } else {
                info.error_description
            };
            return Err(Error::Provider {
                code: info.error,
                description,
            });
        }
        Ok((ShareContext::new(share_id, info.pass_code_token), info.title))
    }

    /// Fetches one page of a folder's children.
    pub async fn folder_page(
        &self,
        share: &ShareContext,
        parent_id: &str,
        page_token: Option<&str>,
    ) -> Result<FolderPage, Error> {
        let limit = self.config.page_limit.to_string();
        let mut params = vec![
            ("share_id", share.share_id.as_str()),
            ("parent_id", parent_id),
            ("thumbnail_size", "SIZE_LARGE"),
            ("limit", limit.as_str()),
            ("with_audit", "false"),
        ];
        if !share.pass_code_token.is_empty() {
            params.push(("pass_code_token", share.pass_code_token.as_str()));
        }
        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            params.push(("page_token", token));
        }
        self.get(&share.share_id, "/drive/v1/share/detail", &params)
            .await
    }

    /// Lists every file in the share, depth first.
    pub async fn list_files(&self, share: &ShareContext) -> Result<Vec<FileDescriptor>, Error> {
        list_tree(self, share, "", "").await
    }

    /// Fetches the download-relevant details of one file.
    pub async fn file_info(&self, share: &ShareContext, file_id: &str) -> Result<FileInfo, Error> {
        let resp: FileInfoResponse = self
            .get(
                &share.share_id,
                "/drive/v1/share/file_info",
                &[
                    ("share_id", share.share_id.as_str()),
                    ("file_id", file_id),
                    ("pass_code_token", share.pass_code_token.as_str()),
                ],
            )
            .await?;
        Ok(resp.file_info.unwrap_or_default())
    }

    /// Resolves a file id into a download URL (empty if none is usable).
    pub async fn download_link(
        &self,
        share: &ShareContext,
        file_id: &str,
    ) -> Result<String, Error> {
        let info = self.file_info(share, file_id).await?;
        Ok(resolve_link(&info))
    }
}

impl FolderPager for ShareClient {
    fn list_page<'a>(
        &'a self,
        share: &'a ShareContext,
        parent_id: &'a str,
        page_token: Option<&'a str>,
    ) -> PageFuture<'a> {
        Box::pin(self.folder_page(share, parent_id, page_token))
    }
}

fn header_value(value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(value.to_string()))
}

/// Device id the provider expects: hex MD5 of the share id.
pub(crate) fn device_id(share_id: &str) -> String {
    hex::encode(Md5::digest(share_id.as_bytes()))
}

/// Builds an error from a non-success response.
fn provider_error(status: u16, body: &[u8]) -> Error {
    if let Ok(info) = serde_json::from_slice::<ShareInfo>(body) {
        if !info.error.is_empty() {
            return Error::Provider {
                code: info.error,
                description: info.error_description,
            };
        }
    }
    let text = String::from_utf8_lossy(body);
    Error::Api {
        status,
        body: text.chars().take(MAX_BODY_IN_ERROR).collect(),
    }
}

/// Extracts the share id from a share URL (`…/s/<id>…`).
///
/// Input without a `/s/` segment is taken as a bare id.
pub fn extract_share_id(input: &str) -> String {
    if let Some(pos) = input.find("/s/") {
        let id: String = input[pos + 3..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if !id.is_empty() {
            return id;
        }
    }
    input.trim().to_string()
}
