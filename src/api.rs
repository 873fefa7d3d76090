// API client module: a small blocking HTTP client for the SM.MS image host.
// It authenticates once on construction and then uploads files one at a time.

use crate::error::{Result, SyncError};
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Sent on every upload; the host rejects some non-browser agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36";

/// Response code the host returns when identical content was uploaded before.
const IMAGE_REPEATED: &str = "image_repeated";

/// Anything that can turn a local image into a hosted URL. The scanner only
/// talks to this trait so other hosting backends can be plugged in.
pub trait Uploader {
    fn upload(&self, path: &Path) -> Result<String>;
}

/// Authenticated client for the SM.MS v2 API.
#[derive(Debug)]
pub struct SmmsClient {
    client: Client,
    endpoint: String,
    token: String,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    #[serde(default)]
    data: Option<TokenData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TokenData {
    token: String,
}

/// Body of `POST /upload`. The host fills different fields depending on
/// the outcome, so everything is optional.
#[derive(Deserialize, Debug, Default)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<UploadData>,
    /// Existing URL, only present for `image_repeated`.
    #[serde(default)]
    pub images: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UploadData {
    pub url: String,
}

impl UploadResponse {
    /// Resolve the hosted URL, treating a duplicate-content reply as success.
    pub fn into_url(self, path: &Path) -> Result<String> {
        if self.success {
            return self
                .data
                .map(|d| d.url)
                .ok_or_else(|| SyncError::upload(path, "response has no data.url"));
        }
        if self.code.as_deref() == Some(IMAGE_REPEATED) {
            return self
                .images
                .ok_or_else(|| SyncError::upload(path, "image_repeated without images field"));
        }
        let reason = self
            .message
            .or(self.code)
            .unwrap_or_else(|| "unknown error".into());
        Err(SyncError::upload(path, format!("Upload failed: {reason}")))
    }
}

impl SmmsClient {
    /// Exchange credentials for a session token. Fails if the host does not
    /// hand one back; nothing else can proceed without it.
    pub fn connect(endpoint: &str, username: &str, password: &str) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint);
        let client = Client::builder()
            .build()
            .map_err(|e| SyncError::Auth(format!("failed to build HTTP client: {e}")))?;

        let url = format!("{}/token", endpoint);
        let res = client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .map_err(|e| SyncError::Auth(format!("failed to send token request: {e}")))?;
        let resp: TokenResponse = res
            .json()
            .map_err(|e| SyncError::Auth(format!("parsing token response json: {e}")))?;

        let token = match resp.data {
            Some(data) => data.token,
            None => {
                let why = resp.message.unwrap_or_else(|| "response has no data.token".into());
                return Err(SyncError::Auth(why));
            }
        };
        tracing::debug!(endpoint = %endpoint, "obtained session token");

        Ok(SmmsClient {
            client,
            endpoint,
            token,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&self.token)
            .map_err(|e| SyncError::Auth(format!("token is not a valid header value: {e}")))?;
        headers.insert(AUTHORIZATION, token);
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        Ok(headers)
    }
}

impl Uploader for SmmsClient {
    fn upload(&self, path: &Path) -> Result<String> {
        let url = format!("{}/upload", &self.endpoint);

        let file = File::open(path).map_err(|e| SyncError::io(path, e))?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        let part = multipart::Part::reader(file)
            .file_name(file_name)
            .mime_str(mime_for(path))
            .map_err(|e| SyncError::upload(path, e))?;
        let form = multipart::Form::new().part("smfile", part);

        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .map_err(|e| SyncError::upload(path, e))?;
        let resp: UploadResponse = res.json().map_err(|e| SyncError::upload(path, e))?;
        resp.into_url(path)
    }
}

/// `https://sm.ms/api/v2/` and `https://sm.ms/api/v2` name the same API.
fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// MIME type from the file extension, the set the scanner recognises.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
