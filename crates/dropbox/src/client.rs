//! Dropbox HTTP client.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::arg::{AppendArg, CommitInfo, FinishArg, StartArg, UploadCursor, header_arg};
use crate::error::{Error, interpret_error};

const DEFAULT_API_BASE: &str = "https://api.dropboxapi.com";
const DEFAULT_CONTENT_BASE: &str = "https://content.dropboxapi.com";
const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// Endpoints and timeouts of the destination store.
#[derive(Debug, Clone)]
pub struct DropboxConfig {
    /// Base URL of the RPC endpoints (account check).
    pub api_base: String,
    /// Base URL of the content endpoints (uploads).
    pub content_base: String,
    /// Timeout of each upload request.
    pub upload_timeout: Duration,
    /// Timeout of the account check.
    pub account_timeout: Duration,
}

impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            content_base: DEFAULT_CONTENT_BASE.to_string(),
            upload_timeout: Duration::from_secs(600),
            account_timeout: Duration::from_secs(10),
        }
    }
}

/// Identity of the account behind a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub display_name: String,
    pub email: String,
}

#[derive(Deserialize)]
struct AccountResponse {
    #[serde(default)]
    name: AccountName,
    #[serde(default)]
    email: String,
}

#[derive(Default, Deserialize)]
struct AccountName {
    #[serde(default)]
    display_name: String,
}

/// Metadata of a committed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileMetadata {
    #[serde(default)]
    pub id: String,
    /// Canonical display path chosen by the store (may differ from the
    /// requested path after autorename).
    #[serde(default)]
    pub path_display: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Deserialize)]
struct SessionStartResponse {
    #[serde(default)]
    session_id: String,
}

/// Authenticated client for one destination account.
pub struct DropboxClient {
    http: reqwest::Client,
    credential: String,
    config: DropboxConfig,
}

impl DropboxClient {
    /// Creates a client for `credential` (an OAuth bearer token).
    pub fn new(credential: &str, config: DropboxConfig) -> Result<Self, Error> {
        let credential = credential.trim();
        if credential.is_empty() || credential.chars().any(char::is_whitespace) {
            return Err(Error::InvalidCredential);
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            credential: credential.to_string(),
            config,
        })
    }

    /// Looks up the account the credential belongs to.
    pub async fn current_account(&self) -> Result<Account, Error> {
        let url = format!("{}/2/users/get_current_account", self.config.api_base);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.credential)
            .timeout(self.config.account_timeout)
            .send()
            .await?;
        let account: AccountResponse = decode("account", resp).await?;
        Ok(Account {
            display_name: account.name.display_name,
            email: account.email,
        })
    }

    /// Uploads a whole payload in one request.
    pub async fn upload(&self, commit: &CommitInfo, data: Vec<u8>) -> Result<FileMetadata, Error> {
        let arg = header_arg(commit)?;
        self.content_call("upload", "upload", arg, data).await
    }

    /// Opens an upload session carrying the first chunk. Returns the
    /// session id.
    pub async fn start_session(&self, data: Vec<u8>) -> Result<String, Error> {
        let arg = header_arg(&StartArg { close: false })?;
        let resp: SessionStartResponse = self
            .content_call("session start", "upload_session/start", arg, data)
            .await?;
        if resp.session_id.is_empty() {
            return Err(Error::Protocol(
                "upload session start returned no session_id".into(),
            ));
        }
        Ok(resp.session_id)
    }

    /// Appends a chunk at `cursor.offset`.
    pub async fn append(&self, cursor: UploadCursor<'_>, data: Vec<u8>) -> Result<(), Error> {
        let arg = header_arg(&AppendArg {
            cursor,
            close: false,
        })?;
        let _: serde_json::Value = self
            .content_call("append", "upload_session/append_v2", arg, data)
            .await?;
        Ok(())
    }

    /// Closes the session with a final (possibly empty) chunk and commits.
    pub async fn finish(
        &self,
        cursor: UploadCursor<'_>,
        commit: &CommitInfo,
        data: Vec<u8>,
    ) -> Result<FileMetadata, Error> {
        let arg = header_arg(&FinishArg { cursor, commit })?;
        self.content_call("finish", "upload_session/finish", arg, data)
            .await
    }

    async fn content_call<T: DeserializeOwned>(
        &self,
        label: &'static str,
        endpoint: &str,
        arg: String,
        data: Vec<u8>,
    ) -> Result<T, Error> {
        let url = format!("{}/2/files/{endpoint}", self.config.content_base);
        debug!(call = label, bytes = data.len(), "dropbox request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.credential)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(API_ARG_HEADER, arg)
            .timeout(self.config.upload_timeout)
            .body(data)
            .send()
            .await?;
        decode(label, resp).await
    }
}

/// Checks the status and decodes the body.
///
/// An empty or `null` success body decodes as JSON `null`.
async fn decode<T: DeserializeOwned>(
    label: &'static str,
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.bytes().await?;
    debug!(call = label, status = status.as_u16(), "dropbox response");

    if !status.is_success() {
        return Err(interpret_error(label, status.as_u16(), &body));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("null")?);
    }
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// A request as seen by the mock server.
    #[derive(Debug, Clone)]
    struct Seen {
        head: String,
        body: Vec<u8>,
    }

    impl Seen {
        fn header(&self, name: &str) -> Option<String> {
            let prefix = format!("{}:", name.to_lowercase());
            self.head
                .lines()
                .find(|l| l.to_lowercase().starts_with(&prefix))
                .map(|l| l[prefix.len()..].trim().to_string())
        }
    }

    /// Reads one full HTTP request (head + Content-Length body).
    async fn read_request(stream: &mut tokio::net::TcpStream) -> Seen {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 4096];
        let head_end = loop {
            let n = stream.read(&mut tmp).await.unwrap();
            if n == 0 {
                break buf.len();
            }
            buf.extend_from_slice(&tmp[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let len = head
            .lines()
            .find_map(|l| {
                l.to_lowercase()
                    .strip_prefix("content-length:")
                    .map(|v| v.trim().parse::<usize>().unwrap())
            })
            .unwrap_or(0);
        let mut body = buf[head_end..].to_vec();
        while body.len() < len {
            let n = stream.read(&mut tmp).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&tmp[..n]);
        }
        Seen { head, body }
    }

    async fn mock_server(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, Arc<Mutex<Vec<Seen>>>, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_srv = Arc::clone(&seen);

        let handle = tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let req = read_request(&mut stream).await;
                seen_srv.lock().unwrap().push(req);
                let resp = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (url, seen, handle)
    }

    fn client(base: &str) -> DropboxClient {
        DropboxClient::new(
            "tok-123",
            DropboxConfig {
                api_base: base.to_string(),
                content_base: base.to_string(),
                ..DropboxConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_blank_credential() {
        assert!(matches!(
            DropboxClient::new("  ", DropboxConfig::default()),
            Err(Error::InvalidCredential)
        ));
        assert!(matches!(
            DropboxClient::new("a b", DropboxConfig::default()),
            Err(Error::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn current_account_parses_identity() {
        let (url, seen, handle) = mock_server(vec![(
            200,
            r#"{"account_id":"dbid:x","name":{"display_name":"Ada L"},"email":"ada@example.com"}"#,
        )])
        .await;

        let account = client(&url).current_account().await.unwrap();
        assert_eq!(account.display_name, "Ada L");
        assert_eq!(account.email, "ada@example.com");

        let req = seen.lock().unwrap()[0].clone();
        assert!(req.head.starts_with("POST /2/users/get_current_account"));
        assert_eq!(req.header("authorization").unwrap(), "Bearer tok-123");

        handle.abort();
    }

    #[tokio::test]
    async fn current_account_failure_reports_status() {
        let (url, _seen, handle) =
            mock_server(vec![(401, r#"{"error_summary":"invalid_access_token/.."}"#)]).await;

        let err = client(&url).current_account().await.unwrap_err();
        assert_eq!(err.status_message(), "HTTP 401: invalid_access_token/..");

        handle.abort();
    }

    #[tokio::test]
    async fn simple_upload_sends_payload_and_commit() {
        let (url, seen, handle) = mock_server(vec![(
            200,
            r#"{"id":"id:1","path_display":"/PikPak Downloads/a (1).txt","size":5}"#,
        )])
        .await;

        let commit = CommitInfo::add("/PikPak Downloads/a.txt");
        let meta = client(&url).upload(&commit, b"hello".to_vec()).await.unwrap();
        assert_eq!(meta.path_display, "/PikPak Downloads/a (1).txt");

        let req = seen.lock().unwrap()[0].clone();
        assert!(req.head.starts_with("POST /2/files/upload "));
        assert_eq!(req.body, b"hello");
        assert_eq!(
            req.header("content-type").unwrap(),
            "application/octet-stream"
        );
        let arg: serde_json::Value =
            serde_json::from_str(&req.header("dropbox-api-arg").unwrap()).unwrap();
        assert_eq!(arg["path"], "/PikPak Downloads/a.txt");
        assert_eq!(arg["autorename"], true);

        handle.abort();
    }

    #[tokio::test]
    async fn session_calls_carry_cursor() {
        let (url, seen, handle) = mock_server(vec![
            (200, r#"{"session_id":"sess-9"}"#),
            (200, "null"),
            (200, r#"{"path_display":"/d/big.bin"}"#),
        ])
        .await;

        let c = client(&url);
        let sid = c.start_session(vec![1; 4]).await.unwrap();
        assert_eq!(sid, "sess-9");
        c.append(
            UploadCursor {
                session_id: &sid,
                offset: 4,
            },
            vec![2; 4],
        )
        .await
        .unwrap();
        let meta = c
            .finish(
                UploadCursor {
                    session_id: &sid,
                    offset: 8,
                },
                &CommitInfo::add("/d/big.bin"),
                vec![3; 2],
            )
            .await
            .unwrap();
        assert_eq!(meta.path_display, "/d/big.bin");

        let reqs = seen.lock().unwrap();
        assert!(reqs[0].head.starts_with("POST /2/files/upload_session/start"));
        assert!(reqs[1].head.starts_with("POST /2/files/upload_session/append_v2"));
        assert!(reqs[2].head.starts_with("POST /2/files/upload_session/finish"));
        let append: serde_json::Value =
            serde_json::from_str(&reqs[1].header("dropbox-api-arg").unwrap()).unwrap();
        assert_eq!(append["cursor"]["offset"], 4);
        let finish: serde_json::Value =
            serde_json::from_str(&reqs[2].header("dropbox-api-arg").unwrap()).unwrap();
        assert_eq!(finish["cursor"]["offset"], 8);
        assert_eq!(finish["commit"]["path"], "/d/big.bin");
        assert_eq!(reqs[2].body.len(), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn missing_session_id_is_protocol_error() {
        let (url, _seen, handle) = mock_server(vec![(200, "{}")]).await;

        let err = client(&url).start_session(vec![0; 3]).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));

        handle.abort();
    }

    #[tokio::test]
    async fn non_success_uses_provider_summary() {
        let (url, _seen, handle) = mock_server(vec![(
            409,
            r#"{"error_summary":"path/conflict/file/..","error":{".tag":"path"}}"#,
        )])
        .await;

        let err = client(&url)
            .upload(&CommitInfo::add("/x"), vec![1])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Dropbox upload 409: path/conflict/file/..");

        handle.abort();
    }
}
