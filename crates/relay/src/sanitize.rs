//! Destination naming.

/// Characters the destination store rejects in file names.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Returns the last `/` segment of `name` with forbidden characters
/// replaced by `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

/// Strips trailing `/` from a destination folder.
pub fn normalize_folder(folder: &str) -> &str {
    folder.trim_end_matches('/')
}

/// Full destination path of a file relayed into `folder`.
pub fn destination_path(folder: &str, name: &str) -> String {
    format!("{}/{}", normalize_folder(folder), sanitize_file_name(name))
}
