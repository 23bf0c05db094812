//! Share-to-destination relay.
//!
//! This crate holds the **business logic** of a relay batch. Collaborators
//! (link resolution, byte download, destination store) are reached through
//! traits so the pipeline is testable without a network; adapters for the
//! real clients live in [`source`].
//!
//! # Pipeline (per file)
//!
//! 1. **Resolve** the download location (unless pre-resolved)
//! 2. **Download** into a scratch buffer, reporting `downloading` percents
//! 3. **Upload** via a single request or a chunked session
//! 4. **Release** the scratch buffer and report `done` / `error`

pub mod batch;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod sanitize;
pub mod source;
pub mod stream;
pub mod types;
pub mod upload;

pub use batch::RelayBatch;
pub use error::RelayError;
pub use pipeline::RelayPipeline;
pub use sanitize::{destination_path, normalize_folder, sanitize_file_name};
pub use source::{ByteSource, DestinationStore, Download, HttpSource, LinkResolver};
pub use stream::{relay_to_writer, write_events};
pub use types::{BatchSummary, FileOutcome, RelayConfig};
pub use upload::{UploadMode, upload_buffer, upload_session};
