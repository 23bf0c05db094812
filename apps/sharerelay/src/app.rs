//! Subcommand implementations.

use std::path::Path;

use anyhow::Context;
use sharerelay_dropbox::{Account, DropboxClient};
use sharerelay_protocol::{RelayRequest, ShareListing};
use sharerelay_relay::{BatchSummary, HttpSource, RelayBatch, relay_to_writer};
use sharerelay_share::{ShareClient, extract_share_id};
use sharerelay_transfer::ScratchDir;
use tokio::io::AsyncWrite;
use tracing::info;

use crate::config::Config;

/// Opens a share (URL or bare id) and lists every file in it.
pub async fn list(config: &Config, share: &str) -> anyhow::Result<ShareListing> {
    let client = ShareClient::new(config.share_config())?;
    list_with(&client, share).await
}

async fn list_with(client: &ShareClient, share: &str) -> anyhow::Result<ShareListing> {
    let share_id = extract_share_id(share);
    let (context, title) = client
        .open_share(&share_id)
        .await
        .with_context(|| format!("opening share {share_id}"))?;
    let files = client
        .list_files(&context)
        .await
        .with_context(|| format!("listing share {share_id}"))?;

    info!(share = %share_id, files = files.len(), "share listed");
    Ok(ShareListing {
        share_name: title,
        share_id: context.share_id,
        pass_code_token: context.pass_code_token,
        total: files.len(),
        files,
    })
}

/// Lists a share and resolves the download link of every file.
///
/// Files without a usable link keep an empty `downloadUrl`.
pub async fn links(config: &Config, share: &str) -> anyhow::Result<ShareListing> {
    let client = ShareClient::new(config.share_config())?;
    let mut listing = list_with(&client, share).await?;
    let context = sharerelay_protocol::ShareContext::new(
        listing.share_id.clone(),
        listing.pass_code_token.clone(),
    );
    for file in &mut listing.files {
        file.download_url = client
            .download_link(&context, &file.id)
            .await
            .with_context(|| format!("resolving link for {}", file.name))?;
    }
    Ok(listing)
}

/// Checks a destination token by fetching the account identity.
///
/// Failures read `HTTP <status>: <summary>`.
pub async fn check_token(config: &Config, token: &str) -> anyhow::Result<Account> {
    let client = DropboxClient::new(token, config.dropbox_config())?;
    client
        .current_account()
        .await
        .map_err(|e| anyhow::anyhow!(e.status_message()))
}

/// Builds a relay request covering a whole share.
pub async fn request_for_share(
    config: &Config,
    share: &str,
    credential: String,
    folder: Option<String>,
) -> anyhow::Result<RelayRequest> {
    let listing = list(config, share).await?;
    Ok(RelayRequest {
        credential,
        destination_folder: folder.unwrap_or_else(|| config.destination_folder.clone()),
        share_id: listing.share_id,
        pass_code_token: listing.pass_code_token,
        files: listing.files,
    })
}

/// Reads a relay request from a JSON file, or stdin for `-`.
pub fn read_request(source: &Path) -> anyhow::Result<RelayRequest> {
    let content = if source == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("reading request from stdin")?
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("reading request {}", source.display()))?
    };
    let request = serde_json::from_str(&content).context("decoding relay request")?;
    Ok(request)
}

/// Runs a relay batch, streaming events to `writer`.
pub async fn relay<W: AsyncWrite + Unpin>(
    config: &Config,
    request: RelayRequest,
    writer: &mut W,
) -> anyhow::Result<BatchSummary> {
    let relay_config = config.relay_config();
    let folder = if request.destination_folder.trim().is_empty() {
        relay_config.default_folder.clone()
    } else {
        request.destination_folder.clone()
    };

    let share_config = config.share_config();
    let source = HttpSource::new(relay_config.download_timeout, &share_config.user_agent)?;
    let share = ShareClient::new(share_config)?;
    let store = DropboxClient::new(&request.credential, config.dropbox_config())?;
    let scratch = ScratchDir::new()?;

    let batch = RelayBatch::new(&share, &source, &store, relay_config, scratch);
    let summary = relay_to_writer(batch, &request.share(), &folder, &request.files, writer).await?;
    Ok(summary)
}
