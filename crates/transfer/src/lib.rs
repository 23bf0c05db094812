//! Local byte staging for the relay: file-backed scratch buffers, chunked
//! reads over any async source, and progress percentages.

mod chunked;
mod progress;
mod scratch;

pub use chunked::ChunkReader;
pub use progress::{PercentTracker, percent};
pub use scratch::{ScratchBuffer, ScratchDir};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scratch buffer truncated: expected {expected} bytes, read {read}")]
    Truncated { expected: u64, read: u64 },
}
