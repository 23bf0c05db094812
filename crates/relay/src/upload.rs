//! Upload session protocol.
//!
//! Small payloads go up in one request. Larger ones open a session with
//! the first chunk, append full chunks while more data follows the
//! current one, and finish with the chunk that reaches the end. When the
//! chunks run out before a finishing chunk was seen, the session is
//! closed with an empty finish at the final offset.

use sharerelay_transfer::{ChunkReader, PercentTracker, ScratchBuffer};
use tokio::io::AsyncRead;
use tracing::debug;

use crate::error::RelayError;
use crate::events::FileEvents;
use crate::source::DestinationStore;
use crate::types::RelayConfig;

/// Transfer strategy for a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// One request carrying the whole payload and the commit.
    Simple,
    /// start / append* / finish.
    Session,
}

impl UploadMode {
    /// `Simple` up to and including `threshold` bytes.
    pub fn for_size(size: u64, threshold: u64) -> Self {
        if size <= threshold {
            Self::Simple
        } else {
            Self::Session
        }
    }
}

/// Drains `buffer` into the store at `path`. Returns the committed path.
///
/// The buffer is consumed and released before this returns, on success
/// and on failure alike.
pub async fn upload_buffer(
    store: &dyn DestinationStore,
    buffer: ScratchBuffer,
    path: &str,
    config: &RelayConfig,
    events: Option<&FileEvents<'_>>,
) -> Result<String, RelayError> {
    let size = buffer.len();
    let mode = UploadMode::for_size(size, config.upload_threshold);
    debug!(path, size, ?mode, "uploading");

    match mode {
        UploadMode::Simple => {
            let mut chunks = buffer.into_chunks(0).await?;
            let data = chunks.next_chunk().await?.unwrap_or_default();
            drop(chunks);
            store.upload(path, data).await
        }
        UploadMode::Session => {
            let chunks = buffer.into_chunks(config.upload_chunk_size).await?;
            upload_session(store, chunks, path, events).await
        }
    }
}

/// Runs a chunked session over `chunks`. Returns the committed path.
///
/// With `events`, an `uploading` percent is reported after every chunk
/// that moved the committed offset, below 100.
pub async fn upload_session<R: AsyncRead + Unpin>(
    store: &dyn DestinationStore,
    mut chunks: ChunkReader<R>,
    path: &str,
    events: Option<&FileEvents<'_>>,
) -> Result<String, RelayError> {
    let total = chunks.total();
    let mut tracker = PercentTracker::new(total);
    tracker.update(0);

    let first = chunks.next_chunk().await?.unwrap_or_default();
    let mut offset = first.len() as u64;
    let session_id = store.start_session(first).await?;
    debug!(path, session_id = %session_id, offset, "upload session started");
    report(&mut tracker, offset, events).await?;

    while let Some(chunk) = chunks.next_chunk().await? {
        let len = chunk.len() as u64;
        let remaining_after = total.saturating_sub(offset + len);
        if remaining_after == 0 {
            debug!(path, offset, len, "finishing upload session");
            return store.finish(&session_id, offset, path, chunk).await;
        }
        store.append(&session_id, offset, chunk).await?;
        offset += len;
        debug!(path, offset, "appended chunk");
        report(&mut tracker, offset, events).await?;
    }

    debug!(path, offset, "finishing upload session with empty chunk");
    store.finish(&session_id, offset, path, Vec::new()).await
}

async fn report(
    tracker: &mut PercentTracker,
    offset: u64,
    events: Option<&FileEvents<'_>>,
) -> Result<(), RelayError> {
    let Some(events) = events else {
        return Ok(());
    };
    match tracker.update(offset) {
        Some(pct) if pct < 100 => events.uploading(pct).await,
        _ => Ok(()),
    }
}
