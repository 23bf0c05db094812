//! `Dropbox-API-Arg` header payloads.
//!
//! Content endpoints take their JSON arguments in a header, so the JSON
//! must be pure ASCII: `0x7F` and every non-ASCII code point are written
//! as `\uXXXX` escapes (UTF-16 surrogate pairs above the BMP).

use serde::Serialize;

/// Commit metadata for a new file. Uploads never overwrite: a name clash
/// makes the store pick a new name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub path: String,
    pub mode: &'static str,
    pub autorename: bool,
    pub mute: bool,
}

impl CommitInfo {
    pub fn add(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: "add",
            autorename: true,
            mute: false,
        }
    }
}

/// Position inside an open upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadCursor<'a> {
    pub session_id: &'a str,
    pub offset: u64,
}

#[derive(Serialize)]
pub(crate) struct StartArg {
    pub close: bool,
}

#[derive(Serialize)]
pub(crate) struct AppendArg<'a> {
    pub cursor: UploadCursor<'a>,
    pub close: bool,
}

#[derive(Serialize)]
pub(crate) struct FinishArg<'a> {
    pub cursor: UploadCursor<'a>,
    pub commit: &'a CommitInfo,
}

/// Serializes `arg` as header-safe JSON.
pub fn header_arg<T: Serialize>(arg: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(arg)?;
    if json.bytes().all(|b| b < 0x7F) {
        return Ok(json);
    }

    let mut out = String::with_capacity(json.len() + 16);
    for c in json.chars() {
        if (c as u32) < 0x7F {
            out.push(c);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{unit:04x}"));
        }
    }
    Ok(out)
}
