//! Line-delimited event output.
//!
//! The batch produces into a bounded channel; [`write_events`] drains it
//! into any async writer, one JSON object per line, flushing each line.
//! A failed write is treated as the consumer leaving: the batch is
//! cancelled and the channel closed so in-flight sends fail.

use sharerelay_protocol::{FileDescriptor, ProgressEvent, ShareContext};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::batch::RelayBatch;
use crate::error::RelayError;
use crate::types::BatchSummary;

/// Writes every received event to `writer` until the channel closes.
///
/// Returns the number of lines written.
pub async fn write_events<W: AsyncWrite + Unpin>(
    mut rx: mpsc::Receiver<ProgressEvent>,
    writer: &mut W,
    cancel: CancellationToken,
) -> Result<usize, RelayError> {
    let mut written = 0;
    while let Some(event) = rx.recv().await {
        let line = event.to_line()?;
        let result = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = result {
            cancel.cancel();
            rx.close();
            return Err(e.into());
        }
        written += 1;
    }
    Ok(written)
}

/// Runs `batch` and streams its events to `writer` concurrently.
pub async fn relay_to_writer<W: AsyncWrite + Unpin>(
    mut batch: RelayBatch<'_>,
    share: &ShareContext,
    folder: &str,
    files: &[FileDescriptor],
    writer: &mut W,
) -> Result<BatchSummary, RelayError> {
    let rx = batch.take_events().ok_or(RelayError::Cancelled)?;
    let cancel = batch.cancel_token();

    let (summary, written) = tokio::join!(
        batch.run(share, folder, files),
        write_events(rx, writer, cancel)
    );
    match written {
        Ok(lines) => debug!(lines, "event stream closed"),
        Err(e) => warn!(error = %e, "event stream aborted"),
    }
    Ok(summary)
}
