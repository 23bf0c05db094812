/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Payloads up to this size are committed with a single upload request (140 MiB).
pub const DEFAULT_UPLOAD_THRESHOLD: u64 = 140 * MIB;

/// Chunk size for upload sessions (50 MiB).
pub const DEFAULT_UPLOAD_CHUNK_SIZE: usize = 50 * 1024 * 1024;

/// Read granularity when streaming a download into the scratch store (8 MiB).
///
/// Independent of [`DEFAULT_UPLOAD_CHUNK_SIZE`].
pub const DEFAULT_DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Maximum number of characters kept in an `error` event detail.
pub const MAX_ERROR_DETAIL: usize = 500;

/// Destination folder used when a request does not name one.
pub const DEFAULT_DESTINATION_FOLDER: &str = "/PikPak Downloads";

/// Detail reported when no download location could be resolved for a file.
pub const NO_DOWNLOAD_LINK: &str = "no download link";
