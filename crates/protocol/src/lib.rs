//! Wire types shared by the share relay crates.
//!
//! Everything that crosses a process boundary lives here: the file
//! descriptors produced by the share lister, the relay request accepted
//! from a front end, and the line-delimited progress events written back.

pub mod constants;
pub mod events;
pub mod types;

// Re-export primary types for convenience.
pub use events::{EventLineError, ProgressEvent};
pub use types::{FileDescriptor, RelayRequest, ResolvedLink, ShareContext, ShareListing};
