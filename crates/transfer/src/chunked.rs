use tokio::io::{AsyncRead, AsyncReadExt};

use crate::TransferError;

/// Reads a source of known length in fixed-size chunks.
///
/// Every chunk except the last is exactly `chunk_size` bytes.
pub struct ChunkReader<R> {
    reader: R,
    chunk_size: usize,
    offset: u64,
    total: u64,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    /// Wraps `reader`, which is expected to yield exactly `total` bytes.
    ///
    /// A `chunk_size` of 0 reads everything as one chunk.
    pub fn new(reader: R, chunk_size: usize, total: u64) -> Self {
        let chunk_size = if chunk_size == 0 {
            usize::try_from(total).unwrap_or(usize::MAX).max(1)
        } else {
            chunk_size
        };
        Self {
            reader,
            chunk_size,
            offset: 0,
            total,
        }
    }

    /// Reads the next chunk. Returns `None` once `total` bytes were read.
    ///
    /// A source that ends early is an error, never a short upload.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransferError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }

        let want = remaining.min(self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; want];
        let mut filled = 0;
        while filled < want {
            let n = self.reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(TransferError::Truncated {
                    expected: self.total,
                    read: self.offset + filled as u64,
                });
            }
            filled += n;
        }

        self.offset += want as u64;
        Ok(Some(buf))
    }

    /// Bytes handed out so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Expected length of the source.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.offset)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
