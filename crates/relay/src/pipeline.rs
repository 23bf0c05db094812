//! Per-file relay: resolve, download into scratch, upload.

use futures_util::StreamExt;
use sharerelay_protocol::{FileDescriptor, ResolvedLink, ShareContext};
use sharerelay_transfer::{PercentTracker, ScratchBuffer, ScratchDir};
use tracing::{debug, info};

use crate::error::RelayError;
use crate::events::FileEvents;
use crate::sanitize::destination_path;
use crate::source::{ByteSource, DestinationStore, LinkResolver};
use crate::types::RelayConfig;
use crate::upload::upload_buffer;

/// Relays single files using the given collaborators.
pub struct RelayPipeline<'a> {
    resolver: &'a dyn LinkResolver,
    source: &'a dyn ByteSource,
    store: &'a dyn DestinationStore,
    config: &'a RelayConfig,
    scratch: &'a ScratchDir,
}

impl<'a> RelayPipeline<'a> {
    pub fn new(
        resolver: &'a dyn LinkResolver,
        source: &'a dyn ByteSource,
        store: &'a dyn DestinationStore,
        config: &'a RelayConfig,
        scratch: &'a ScratchDir,
    ) -> Self {
        Self {
            resolver,
            source,
            store,
            config,
            scratch,
        }
    }

    /// Relays `file` into `folder` and returns the committed path.
    ///
    /// Emits `downloading` and `uploading` events; the caller owns
    /// `start` and the terminal event. The scratch buffer is gone by the
    /// time this returns.
    pub async fn relay(
        &self,
        events: &FileEvents<'_>,
        share: &ShareContext,
        file: &FileDescriptor,
        folder: &str,
    ) -> Result<String, RelayError> {
        let link = if file.download_url.is_empty() {
            self.resolver.resolve(share, &file.id).await?
        } else {
            ResolvedLink {
                file_id: file.id.clone(),
                url: file.download_url.clone(),
            }
        };
        if link.url.is_empty() {
            return Err(RelayError::NoLink);
        }

        let mut buffer = self.scratch.create_buffer()?;
        self.download(events, file, &link.url, &mut buffer).await?;

        let target = destination_path(folder, &file.name);
        events.uploading(0).await?;
        let path = upload_buffer(self.store, buffer, &target, self.config, Some(events)).await?;
        events.uploading(100).await?;

        info!(index = events.index(), path = %path, "file relayed");
        Ok(path)
    }

    async fn download(
        &self,
        events: &FileEvents<'_>,
        file: &FileDescriptor,
        url: &str,
        buffer: &mut ScratchBuffer,
    ) -> Result<(), RelayError> {
        let mut download = self.source.open(url).await?;

        let total = Some(file.size)
            .filter(|n| *n > 0)
            .or(download.content_length.filter(|n| *n > 0));
        let mut tracker = total.map(PercentTracker::new);
        if let Some(t) = tracker.as_mut() {
            t.update(0);
            events.downloading(0).await?;
        }

        let step = self.config.download_chunk_size.max(1) as u64;
        let mut received = 0u64;
        let mut reported = 0u64;
        while let Some(chunk) = download.body.next().await {
            let chunk = chunk?;
            buffer.write(&chunk).await?;
            received += chunk.len() as u64;

            if received - reported >= step {
                reported = received;
                if let Some(pct) = tracker.as_mut().and_then(|t| t.update(received)) {
                    events.downloading(pct).await?;
                }
            }
        }
        if let Some(pct) = tracker.as_mut().and_then(|t| t.update(received)) {
            events.downloading(pct).await?;
        }

        debug!(index = events.index(), received, ?total, "download complete");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    use sharerelay_protocol::ProgressEvent;
    use tokio::sync::mpsc;

    use crate::source::{Download, RelayFuture};
    use crate::upload::tests::{Call, MemoryStore};

    /// Resolves ids from a fixed table; unknown ids have no link.
    #[derive(Default)]
    pub(crate) struct TableResolver {
        pub links: HashMap<String, String>,
    }

    impl LinkResolver for TableResolver {
        fn resolve<'a>(
            &'a self,
            _share: &'a ShareContext,
            file_id: &'a str,
        ) -> RelayFuture<'a, ResolvedLink> {
            Box::pin(async move {
                Ok(ResolvedLink {
                    file_id: file_id.to_string(),
                    url: self.links.get(file_id).cloned().unwrap_or_default(),
                })
            })
        }
    }

    /// Serves `url -> (bytes, announced length)` in fixed-size pieces.
    pub(crate) struct MemorySource {
        pub bodies: HashMap<String, (usize, Option<u64>)>,
        pub piece: usize,
        /// URLs whose body breaks off after the first piece.
        pub broken: Vec<String>,
    }

    impl MemorySource {
        pub fn new(piece: usize) -> Self {
            Self {
                bodies: HashMap::new(),
                piece,
                broken: Vec::new(),
            }
        }
    }

    impl ByteSource for MemorySource {
        fn open<'a>(&'a self, url: &'a str) -> RelayFuture<'a, Download> {
            Box::pin(async move {
                let Some(&(len, content_length)) = self.bodies.get(url) else {
                    return Err(RelayError::DownloadStatus { status: 404 });
                };
                let mut pieces: Vec<Result<Vec<u8>, RelayError>> = vec![0u8; len]
                    .chunks(self.piece.max(1))
                    .map(|c| Ok(c.to_vec()))
                    .collect();
                if self.broken.iter().any(|u| u == url) {
                    pieces.truncate(1);
                    pieces.push(Err(RelayError::Io(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "connection reset",
                    ))));
                }
                Ok(Download {
                    content_length,
                    body: Box::pin(futures_util::stream::iter(pieces)),
                })
            })
        }
    }

    pub(crate) fn descriptor(id: &str, name: &str, size: u64) -> FileDescriptor {
        FileDescriptor {
            id: id.into(),
            name: name.into(),
            size,
            mime_type: String::new(),
            download_url: String::new(),
        }
    }

    fn small_config() -> RelayConfig {
        RelayConfig {
            upload_threshold: 64,
            upload_chunk_size: 32,
            download_chunk_size: 10,
            ..RelayConfig::default()
        }
    }

    async fn relay_one(
        resolver: &TableResolver,
        source: &MemorySource,
        store: &MemoryStore,
        file: &FileDescriptor,
    ) -> (Result<String, RelayError>, Vec<ProgressEvent>, usize) {
        let config = small_config();
        let scratch = ScratchDir::new().unwrap();
        let (tx, mut rx) = mpsc::channel(256);
        let pipeline = RelayPipeline::new(resolver, source, store, &config, &scratch);
        let events = FileEvents::new(&tx, 0);
        let result = pipeline
            .relay(&events, &ShareContext::new("s", ""), file, "/dest/")
            .await;
        let live = scratch.live_buffers().unwrap();
        drop(events);
        drop(tx);
        let mut seen = Vec::new();
        while let Some(ev) = rx.recv().await {
            seen.push(ev);
        }
        (result, seen, live)
    }

    fn resolver_for(id: &str, url: &str) -> TableResolver {
        TableResolver {
            links: HashMap::from([(id.to_string(), url.to_string())]),
        }
    }

    #[tokio::test]
    async fn small_file_takes_simple_path() {
        let resolver = resolver_for("f1", "u1");
        let mut source = MemorySource::new(10);
        source.bodies.insert("u1".into(), (40, None));
        let store = MemoryStore::default();

        let file = descriptor("f1", "dir/a?.txt", 40);
        let (result, events, live) = relay_one(&resolver, &source, &store, &file).await;

        assert_eq!(result.unwrap(), "/dest/a_.txt");
        assert_eq!(live, 0);
        assert_eq!(
            store.calls(),
            vec![Call::Upload {
                path: "/dest/a_.txt".into(),
                len: 40
            }]
        );
        let downloads: Vec<u8> = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Downloading { .. }))
            .filter_map(ProgressEvent::percent)
            .collect();
        assert_eq!(downloads, vec![0, 25, 50, 75, 100]);
        let uploads: Vec<u8> = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Uploading { .. }))
            .filter_map(ProgressEvent::percent)
            .collect();
        assert_eq!(uploads, vec![0, 100]);
    }

    #[tokio::test]
    async fn large_file_takes_session_path() {
        let resolver = resolver_for("f1", "u1");
        let mut source = MemorySource::new(7);
        source.bodies.insert("u1".into(), (100, Some(100)));
        let store = MemoryStore::default();

        // Size unknown in the descriptor: Content-Length drives percents.
        let file = descriptor("f1", "big.bin", 0);
        let (result, events, live) = relay_one(&resolver, &source, &store, &file).await;

        assert_eq!(result.unwrap(), "/dest/big.bin");
        assert_eq!(live, 0);
        let calls = store.calls();
        assert!(matches!(calls[0], Call::Start { len: 32 }));
        assert!(matches!(calls.last(), Some(Call::Finish { offset: 96, len: 4, .. })));

        let mut last_dl = 0;
        let mut last_ul = 0;
        for ev in &events {
            match ev {
                ProgressEvent::Downloading { percent, .. } => {
                    assert!(*percent >= last_dl && *percent <= 100);
                    last_dl = *percent;
                }
                ProgressEvent::Uploading { percent, .. } => {
                    assert!(*percent >= last_ul && *percent <= 100);
                    last_ul = *percent;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(last_dl, 100);
        assert_eq!(last_ul, 100);
    }

    #[tokio::test]
    async fn unknown_total_emits_no_download_percent() {
        let resolver = resolver_for("f1", "u1");
        let mut source = MemorySource::new(4);
        source.bodies.insert("u1".into(), (12, None));
        let store = MemoryStore::default();

        let (result, events, _) =
            relay_one(&resolver, &source, &store, &descriptor("f1", "x", 0)).await;
        assert!(result.is_ok());
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, ProgressEvent::Downloading { .. }))
        );
    }

    #[tokio::test]
    async fn missing_link_fails_without_scratch() {
        let resolver = TableResolver::default();
        let source = MemorySource::new(4);
        let store = MemoryStore::default();

        let (result, events, live) =
            relay_one(&resolver, &source, &store, &descriptor("f1", "x", 3)).await;
        let err = result.unwrap_err();
        assert_eq!(err.detail(), "no download link");
        assert!(events.is_empty());
        assert_eq!(live, 0);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn preresolved_url_skips_resolver() {
        let resolver = TableResolver::default();
        let mut source = MemorySource::new(4);
        source.bodies.insert("direct".into(), (8, None));
        let store = MemoryStore::default();

        let mut file = descriptor("f1", "x.bin", 8);
        file.download_url = "direct".into();
        let (result, _, _) = relay_one(&resolver, &source, &store, &file).await;
        assert_eq!(result.unwrap(), "/dest/x.bin");
    }

    #[tokio::test]
    async fn broken_download_releases_scratch() {
        let resolver = resolver_for("f1", "u1");
        let mut source = MemorySource::new(4);
        source.bodies.insert("u1".into(), (20, Some(20)));
        source.broken.push("u1".into());
        let store = MemoryStore::default();

        let (result, _, live) =
            relay_one(&resolver, &source, &store, &descriptor("f1", "x", 20)).await;
        assert!(matches!(result, Err(RelayError::Io(_))));
        assert_eq!(live, 0);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_releases_scratch() {
        let resolver = resolver_for("f1", "u1");
        let mut source = MemorySource::new(4);
        source.bodies.insert("u1".into(), (20, None));
        let store = MemoryStore {
            fail_path: Some("/dest/x".into()),
            ..MemoryStore::default()
        };

        let (result, _, live) =
            relay_one(&resolver, &source, &store, &descriptor("f1", "x", 20)).await;
        assert!(matches!(result, Err(RelayError::Destination(_))));
        assert_eq!(live, 0);
    }

    #[tokio::test]
    async fn closed_channel_cancels() {
        let resolver = resolver_for("f1", "u1");
        let mut source = MemorySource::new(4);
        source.bodies.insert("u1".into(), (20, None));
        let store = MemoryStore::default();
        let config = small_config();
        let scratch = ScratchDir::new().unwrap();

        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let pipeline = RelayPipeline::new(&resolver, &source, &store, &config, &scratch);
        let events = FileEvents::new(&tx, 0);
        let result = pipeline
            .relay(&events, &ShareContext::default(), &descriptor("f1", "x", 20), "/d")
            .await;
        assert!(matches!(result, Err(RelayError::Cancelled)));
        assert_eq!(scratch.live_buffers().unwrap(), 0);
        assert!(store.calls().is_empty());
    }
}
