//! Batch orchestrator.
//!
//! Walks a file list strictly in order, relays each file, and publishes
//! the progress events on a bounded channel. A failing file is reported
//! and skipped; only a vanished consumer stops the batch early.

use sharerelay_protocol::{FileDescriptor, ProgressEvent, ShareContext};
use sharerelay_transfer::ScratchDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::RelayError;
use crate::events::FileEvents;
use crate::pipeline::RelayPipeline;
use crate::source::{ByteSource, DestinationStore, LinkResolver};
use crate::types::{BatchSummary, FileOutcome, RelayConfig};

/// One relay run over a list of files.
pub struct RelayBatch<'a> {
    resolver: &'a dyn LinkResolver,
    source: &'a dyn ByteSource,
    store: &'a dyn DestinationStore,
    config: RelayConfig,
    scratch: ScratchDir,
    events_tx: mpsc::Sender<ProgressEvent>,
    events_rx: Option<mpsc::Receiver<ProgressEvent>>,
    cancel: CancellationToken,
}

impl<'a> RelayBatch<'a> {
    /// Creates a batch with its own scratch directory.
    pub fn new(
        resolver: &'a dyn LinkResolver,
        source: &'a dyn ByteSource,
        store: &'a dyn DestinationStore,
        config: RelayConfig,
        scratch: ScratchDir,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer.max(1));
        Self {
            resolver,
            source,
            store,
            config,
            scratch,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<ProgressEvent>> {
        self.events_rx.take()
    }

    /// Token that stops the batch before its next file.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Relays `files` into `folder`, then emits `complete`.
    ///
    /// Consumes the batch so the event channel closes when the run ends.
    pub async fn run(
        self,
        share: &ShareContext,
        folder: &str,
        files: &[FileDescriptor],
    ) -> BatchSummary {
        let total = files.len();
        let pipeline = RelayPipeline::new(
            self.resolver,
            self.source,
            self.store,
            &self.config,
            &self.scratch,
        );
        let mut summary = BatchSummary {
            total,
            ..BatchSummary::default()
        };

        info!(share = %share.share_id, files = total, folder, "relay batch started");

        for (index, file) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let events = FileEvents::new(&self.events_tx, index);

            match relay_file(&pipeline, &events, share, file, folder).await {
                Ok(outcome) => {
                    if outcome.succeeded() {
                        summary.ok += 1;
                    } else {
                        summary.failed += 1;
                    }
                    summary.outcomes.push(outcome);
                }
                Err(_) => {
                    warn!(index, "event consumer gone, stopping batch");
                    self.cancel.cancel();
                    summary.cancelled = true;
                    break;
                }
            }
        }

        let _ = self
            .events_tx
            .send(ProgressEvent::Complete {
                ok: summary.ok,
                total,
            })
            .await;

        info!(
            ok = summary.ok,
            failed = summary.failed,
            total,
            cancelled = summary.cancelled,
            "relay batch finished"
        );
        summary
    }
}

/// Runs one file from `start` to its terminal event.
///
/// Returns `Err` only when the consumer is gone.
async fn relay_file(
    pipeline: &RelayPipeline<'_>,
    events: &FileEvents<'_>,
    share: &ShareContext,
    file: &FileDescriptor,
    folder: &str,
) -> Result<FileOutcome, RelayError> {
    let index = events.index();
    events.start(file.base_name()).await?;

    match pipeline.relay(events, share, file, folder).await {
        Ok(path) => {
            events.done(&path).await?;
            Ok(FileOutcome {
                index,
                name: file.name.clone(),
                path: Some(path),
                error: None,
            })
        }
        Err(RelayError::Cancelled) => Err(RelayError::Cancelled),
        Err(e) => {
            let detail = e.detail();
            warn!(index, name = %file.name, error = %detail, "file failed");
            events.error(detail.clone()).await?;
            Ok(FileOutcome {
                index,
                name: file.name.clone(),
                path: None,
                error: Some(detail),
            })
        }
    }
}
