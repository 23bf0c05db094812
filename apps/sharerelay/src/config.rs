//! Relay configuration.
//!
//! Stored as TOML at `~/.config/sharerelay/config.toml` (Linux) or
//! `%APPDATA%/sharerelay/config.toml` (Windows). Every field is optional;
//! a missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sharerelay_dropbox::DropboxConfig;
use sharerelay_protocol::constants::{
    DEFAULT_DESTINATION_FOLDER, DEFAULT_DOWNLOAD_CHUNK_SIZE, DEFAULT_UPLOAD_CHUNK_SIZE,
    DEFAULT_UPLOAD_THRESHOLD,
};
use sharerelay_relay::RelayConfig;
use sharerelay_share::ShareConfig;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Destination access token; the CLI flag or env var wins over it.
    #[serde(default)]
    pub dropbox_token: Option<String>,

    /// Destination folder used when a request names none.
    #[serde(default = "default_folder")]
    pub destination_folder: String,

    /// Payloads up to this many bytes are uploaded in one request.
    #[serde(default = "default_upload_threshold")]
    pub upload_threshold: u64,

    #[serde(default = "default_upload_chunk_size")]
    pub upload_chunk_size: usize,

    /// Minimum bytes between two download progress events.
    #[serde(default = "default_download_chunk_size")]
    pub download_chunk_size: usize,

    #[serde(default = "default_share_timeout")]
    pub share_timeout_secs: u64,

    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,

    #[serde(default = "default_account_timeout")]
    pub account_timeout_secs: u64,

    /// Browser identity for share API calls and file downloads.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Overrides for the service endpoints (tests, proxies).
    #[serde(default)]
    pub share_api_base: Option<String>,
    #[serde(default)]
    pub dropbox_api_base: Option<String>,
    #[serde(default)]
    pub dropbox_content_base: Option<String>,
}

fn default_folder() -> String {
    DEFAULT_DESTINATION_FOLDER.into()
}

fn default_upload_threshold() -> u64 {
    DEFAULT_UPLOAD_THRESHOLD
}

fn default_upload_chunk_size() -> usize {
    DEFAULT_UPLOAD_CHUNK_SIZE
}

fn default_download_chunk_size() -> usize {
    DEFAULT_DOWNLOAD_CHUNK_SIZE
}

fn default_share_timeout() -> u64 {
    15
}

fn default_download_timeout() -> u64 {
    30
}

fn default_upload_timeout() -> u64 {
    600
}

fn default_account_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dropbox_token: None,
            destination_folder: default_folder(),
            upload_threshold: default_upload_threshold(),
            upload_chunk_size: default_upload_chunk_size(),
            download_chunk_size: default_download_chunk_size(),
            share_timeout_secs: default_share_timeout(),
            download_timeout_secs: default_download_timeout(),
            upload_timeout_secs: default_upload_timeout(),
            account_timeout_secs: default_account_timeout(),
            user_agent: None,
            share_api_base: None,
            dropbox_api_base: None,
            dropbox_content_base: None,
        }
    }
}

impl Config {
    /// Loads `path`, or the default location when `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path(),
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn share_config(&self) -> ShareConfig {
        let mut config = ShareConfig {
            timeout: Duration::from_secs(self.share_timeout_secs),
            ..ShareConfig::default()
        };
        if let Some(base) = &self.share_api_base {
            config.api_base = base.clone();
        }
        if let Some(agent) = &self.user_agent {
            config.user_agent = agent.clone();
        }
        config
    }

    pub fn dropbox_config(&self) -> DropboxConfig {
        let mut config = DropboxConfig {
            upload_timeout: Duration::from_secs(self.upload_timeout_secs),
            account_timeout: Duration::from_secs(self.account_timeout_secs),
            ..DropboxConfig::default()
        };
        if let Some(base) = &self.dropbox_api_base {
            config.api_base = base.clone();
        }
        if let Some(base) = &self.dropbox_content_base {
            config.content_base = base.clone();
        }
        config
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            upload_threshold: self.upload_threshold,
            upload_chunk_size: self.upload_chunk_size,
            download_chunk_size: self.download_chunk_size,
            download_timeout: Duration::from_secs(self.download_timeout_secs),
            default_folder: self.destination_folder.clone(),
            ..RelayConfig::default()
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("sharerelay").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("sharerelay")
            .join("config.toml")
    }
}
