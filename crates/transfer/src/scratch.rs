//! File-backed scratch storage.
//!
//! A [`ScratchDir`] is created once per batch; each relayed file gets one
//! [`ScratchBuffer`] inside it. A buffer's file is deleted when the buffer
//! is dropped, whatever path the owning relay took.

use std::io::SeekFrom;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use tempfile::{TempDir, TempPath};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWriteExt, ReadBuf};
use tracing::debug;

use crate::{ChunkReader, TransferError};

/// Directory holding the scratch buffers of one batch. Removed on drop.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Creates a scratch directory under the system temp dir.
    pub fn new() -> Result<Self, TransferError> {
        let dir = tempfile::Builder::new().prefix("sharerelay-").tempdir()?;
        Ok(Self { dir })
    }

    /// Creates a scratch directory under `parent`.
    pub fn new_in(parent: &Path) -> Result<Self, TransferError> {
        let dir = tempfile::Builder::new()
            .prefix("sharerelay-")
            .tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Allocates an empty buffer.
    pub fn create_buffer(&self) -> Result<ScratchBuffer, TransferError> {
        let (file, path) = tempfile::Builder::new()
            .prefix("file-")
            .tempfile_in(self.dir.path())?
            .into_parts();
        debug!(path = %path.display(), "scratch buffer created");
        Ok(ScratchBuffer {
            file: File::from_std(file),
            path,
            len: 0,
        })
    }

    /// Number of buffers currently alive in this directory.
    pub fn live_buffers(&self) -> Result<usize, TransferError> {
        Ok(std::fs::read_dir(self.dir.path())?.count())
    }
}

/// A growable byte store backed by one temporary file.
pub struct ScratchBuffer {
    file: File,
    path: TempPath,
    len: u64,
}

impl ScratchBuffer {
    /// Appends `data`.
    pub async fn write(&mut self, data: &[u8]) -> Result<(), TransferError> {
        self.file.write_all(data).await?;
        self.len += data.len() as u64;
        Ok(())
    }

    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewinds the buffer and returns a chunked reader over its contents.
    ///
    /// The reader owns the buffer; its file goes away with the reader.
    pub async fn into_chunks(
        mut self,
        chunk_size: usize,
    ) -> Result<ChunkReader<ScratchBuffer>, TransferError> {
        self.file.flush().await?;
        self.file.seek(SeekFrom::Start(0)).await?;
        let len = self.len;
        Ok(ChunkReader::new(self, chunk_size, len))
    }
}

impl AsyncRead for ScratchBuffer {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), bytes = self.len, "scratch buffer released");
    }
}
