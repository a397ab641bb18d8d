use crate::error::GatewayError;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, RANGE};
use reqwest::StatusCode;
use std::io::Read;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_GATEWAY_URL: &str = "https://gw.crustgw.work/ipfs";

/// Cap for generic previews.
pub const PREVIEW_MAX_BYTES: usize = 50 * 1024;
/// Cap when proxying previews the direct load could not serve.
pub const PROXY_PREVIEW_MAX_BYTES: usize = 512 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadInfo {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangedContent {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Read access to file content through a retrieval gateway.
pub trait ContentSource: Send + Sync {
    /// Public URL of `cid` on the gateway.
    fn content_url(&self, cid: &str) -> String;

    /// Metadata-only HEAD request. Any status below 500 is informational.
    /// `None` only on network-level failure.
    fn head_info(&self, cid: &str) -> Option<HeadInfo>;

    /// First `max_bytes` of the content. Any status below 500 is accepted.
    fn ranged_content(&self, cid: &str, max_bytes: usize) -> Option<RangedContent>;

    /// Ranged fetch used by the preview pipeline. Only success statuses count
    /// and the request is bounded by `timeout`.
    fn fetch_preview_bytes(
        &self,
        cid: &str,
        max_bytes: usize,
        timeout: Duration,
    ) -> Result<RangedContent, GatewayError>;

    /// Loads the asset directly from its public URL, as an image viewer would,
    /// and returns that URL on success.
    fn load_image(&self, cid: &str, timeout: Duration) -> Result<String, GatewayError>;
}

pub struct GatewayClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn get_range(
        &self,
        cid: &str,
        max_bytes: usize,
        timeout: Option<Duration>,
        accept: fn(StatusCode) -> bool,
    ) -> Result<RangedContent, GatewayError> {
        let mut req = self
            .http
            .get(self.content_url(cid))
            .header(RANGE, range_header(max_bytes));
        if let Some(t) = timeout {
            req = req.timeout(t);
        }

        let res = req.send()?;
        let status = res.status();
        if !accept(status) {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let content_type = header_str(res.headers(), CONTENT_TYPE);
        let content_length = header_u64(res.headers(), CONTENT_LENGTH);

        // Gateways that ignore Range still only get `max_bytes` read off the wire.
        let mut data = Vec::with_capacity(max_bytes.min(64 * 1024));
        res.take(max_bytes as u64)
            .read_to_end(&mut data)
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(RangedContent {
            data,
            content_type,
            content_length,
        })
    }
}

impl ContentSource for GatewayClient {
    fn content_url(&self, cid: &str) -> String {
        format!("{}/{}", self.base_url, cid)
    }

    fn head_info(&self, cid: &str) -> Option<HeadInfo> {
        let res = match self.http.head(self.content_url(cid)).send() {
            Ok(r) => r,
            Err(e) => {
                warn!(cid = %cid, error = %e, "head request failed");
                return None;
            }
        };
        let status = res.status();
        if status.is_server_error() {
            warn!(cid = %cid, status = status.as_u16(), "head request got server error");
            return None;
        }
        Some(HeadInfo {
            content_type: header_str(res.headers(), CONTENT_TYPE),
            content_length: header_u64(res.headers(), CONTENT_LENGTH),
            status: status.as_u16(),
        })
    }

    fn ranged_content(&self, cid: &str, max_bytes: usize) -> Option<RangedContent> {
        match self.get_range(cid, max_bytes, None, below_server_error) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(cid = %cid, error = %e, "ranged fetch failed");
                None
            }
        }
    }

    fn fetch_preview_bytes(
        &self,
        cid: &str,
        max_bytes: usize,
        timeout: Duration,
    ) -> Result<RangedContent, GatewayError> {
        self.get_range(cid, max_bytes, Some(timeout), |s| s.is_success())
    }

    fn load_image(&self, cid: &str, timeout: Duration) -> Result<String, GatewayError> {
        let url = self.content_url(cid);
        let res = self.http.get(&url).timeout(timeout).send()?;
        let status = res.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }
        let ct = header_str(res.headers(), CONTENT_TYPE).unwrap_or_default();
        if !ct.starts_with("image/") {
            return Err(GatewayError::NotImage(ct));
        }
        debug!(cid = %cid, "direct image load ok");
        Ok(url)
    }
}

fn below_server_error(s: StatusCode) -> bool {
    s.as_u16() < 500
}

/// `Range` header asking for the first `max_bytes` bytes.
pub fn range_header(max_bytes: usize) -> String {
    format!("bytes=0-{}", max_bytes.saturating_sub(1))
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn header_u64(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<u64> {
    header_str(headers, name).and_then(|s| s.parse().ok())
}
