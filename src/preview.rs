//! Per-file preview resolution.
//!
//! A preview starts `Loading`, resolves the content type if it is not known,
//! tries a direct image load for images, falls back to a capped ranged fetch,
//! and retries failed attempts with a linear backoff until the attempt budget
//! is spent. Only an explicit refresh leaves the `Error` state.

use crate::error::GatewayError;
use crate::gateway::{ContentSource, PROXY_PREVIEW_MAX_BYTES};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_millis(1000);
pub const PREVIEW_TIMEOUT: Duration = Duration::from_secs(10);
/// Characters of text shown before the ellipsis marker.
pub const DISPLAY_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStatus {
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Unknown,
    Text,
    Image,
}

impl ContentKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if is_image(ct) => ContentKind::Image,
            Some(ct) if is_textual(ct) => ContentKind::Text,
            _ => ContentKind::Unknown,
        }
    }
}

pub fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

pub fn is_textual(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type.contains("json")
        || content_type.contains("javascript")
}

/// In-memory preview of one file. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewState {
    pub status: PreviewStatus,
    pub content_kind: ContentKind,
    /// Decoded text, a direct URL, or a `data:` URL. `None` means "show the icon".
    pub payload: Option<String>,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub content_type: Option<String>,
}

impl PreviewState {
    pub fn loading(retry_count: u32, content_type: Option<String>) -> Self {
        Self {
            status: PreviewStatus::Loading,
            content_kind: ContentKind::Unknown,
            payload: None,
            retry_count,
            last_error: None,
            content_type,
        }
    }

    pub fn ready(kind: ContentKind, payload: Option<String>, content_type: Option<String>) -> Self {
        Self {
            status: PreviewStatus::Ready,
            content_kind: kind,
            payload,
            retry_count: 0,
            last_error: None,
            content_type,
        }
    }

    pub fn failed(message: String, retry_count: u32, content_type: Option<String>) -> Self {
        Self {
            status: PreviewStatus::Error,
            content_kind: ContentKind::Unknown,
            payload: None,
            retry_count,
            last_error: Some(message),
            content_type,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != PreviewStatus::Loading
    }
}

/// Attempt budget and timing of the preview pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
    pub max_bytes: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: RETRY_DELAY,
            timeout: PREVIEW_TIMEOUT,
            max_bytes: PROXY_PREVIEW_MAX_BYTES,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt that follows the `retry`-th failure (1-based).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }

    /// Whether another attempt is allowed after `retry` failures.
    pub fn should_retry(&self, retry: u32) -> bool {
        retry < self.max_retries
    }
}

type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

pub struct PreviewResolver<'a> {
    source: &'a dyn ContentSource,
    policy: RetryPolicy,
    sleep: Sleeper,
}

impl<'a> PreviewResolver<'a> {
    pub fn new(source: &'a dyn ContentSource, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            sleep: Box::new(thread::sleep),
        }
    }

    pub fn with_sleeper(mut self, sleep: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Runs the pipeline to a terminal state.
    ///
    /// `on_update` sees every intermediate `Loading` state (with its retry count)
    /// before the terminal state is returned.
    pub fn resolve(
        &self,
        cid: &str,
        known_type: Option<String>,
        mut on_update: impl FnMut(&PreviewState),
    ) -> PreviewState {
        let mut content_type = known_type;
        let mut retry_count: u32 = 0;

        loop {
            on_update(&PreviewState::loading(retry_count, content_type.clone()));

            let ct = match &content_type {
                Some(ct) => ct.clone(),
                None => match self.source.head_info(cid).and_then(|i| i.content_type) {
                    Some(ct) => {
                        content_type = Some(ct.clone());
                        ct
                    }
                    None => {
                        debug!(cid = %cid, "content type unknown, showing icon");
                        return PreviewState::ready(ContentKind::Unknown, None, None);
                    }
                },
            };

            match self.attempt(cid, &ct) {
                Ok(mut state) => {
                    state.retry_count = retry_count;
                    return state;
                }
                Err(e) => {
                    retry_count += 1;
                    warn!(cid = %cid, attempt = retry_count, error = %e, "preview attempt failed");
                    if !self.policy.should_retry(retry_count) {
                        return PreviewState::failed(
                            format!("Failed to load preview ({e})"),
                            retry_count,
                            content_type,
                        );
                    }
                    (self.sleep)(self.policy.backoff_delay(retry_count));
                }
            }
        }
    }

    fn attempt(&self, cid: &str, ct: &str) -> Result<PreviewState, GatewayError> {
        let kind = ContentKind::from_content_type(Some(ct));
        let content_type = Some(ct.to_string());

        if kind == ContentKind::Image {
            match self.source.load_image(cid, self.policy.timeout) {
                Ok(url) => return Ok(PreviewState::ready(ContentKind::Image, Some(url), content_type)),
                Err(e) => debug!(cid = %cid, error = %e, "direct image load failed, using ranged fetch"),
            }
        }

        if kind == ContentKind::Unknown {
            // Nothing to render from the bytes; the icon is the preview.
            return Ok(PreviewState::ready(ContentKind::Unknown, None, content_type));
        }

        let content = self
            .source
            .fetch_preview_bytes(cid, self.policy.max_bytes, self.policy.timeout)?;

        let payload = if kind == ContentKind::Text {
            String::from_utf8_lossy(&content.data).into_owned()
        } else {
            data_url(ct, &content.data)
        };
        Ok(PreviewState::ready(kind, Some(payload), content_type))
    }
}

pub fn data_url(content_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, BASE64.encode(data))
}

/// Text as shown in a preview pane: at most `DISPLAY_CHARS` characters,
/// followed by `...` when the payload is longer. The payload itself is untouched.
pub fn display_text(payload: &str) -> String {
    let mut out: String = payload.chars().take(DISPLAY_CHARS).collect();
    if payload.chars().nth(DISPLAY_CHARS).is_some() {
        out.push_str("...");
    }
    out
}

/// Per-file preview bookkeeping owned by the UI.
///
/// Each (re)start gets a fresh request id so results of a superseded run are
/// dropped instead of overwriting the current one.
#[derive(Debug, Clone)]
pub struct PreviewSlot {
    pub request_id: u64,
    pub state: PreviewState,
}

impl PreviewSlot {
    pub fn new(request_id: u64) -> Self {
        Self {
            request_id,
            state: PreviewState::loading(0, None),
        }
    }

    /// Explicit refresh: back to `Loading` with a zero retry count, whatever
    /// the current state is.
    pub fn refresh(&mut self, request_id: u64) {
        self.request_id = request_id;
        self.state = PreviewState::loading(0, None);
    }

    /// Applies a worker update. Returns false if it belongs to an older run.
    pub fn apply(&mut self, request_id: u64, state: PreviewState) -> bool {
        if request_id != self.request_id {
            return false;
        }
        self.state = state;
        true
    }
}
