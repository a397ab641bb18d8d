#![allow(dead_code)]

pub mod http;

use crust_browser::app::App;
use crust_browser::cache::FileCache;
use crust_browser::error::{GatewayError, IndexError};
use crust_browser::gateway::{ContentSource, HeadInfo, RangedContent};
use crust_browser::index::IndexSource;
use crust_browser::listing::ListingController;
use crust_browser::prefs::Prefs;
use crust_browser::preview::RetryPolicy;
use crust_browser::store::MemoryStore;
use crust_browser::types::{FileRecord, ListingPage};
use crust_browser::worker::Workers;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// App over in-memory storage and the given fakes.
pub fn app(index: FakeIndex, gateway: FakeGateway) -> App {
    let listing =
        ListingController::new(FileCache::new(Arc::new(MemoryStore::new())), Prefs::in_memory());
    let workers = Workers::new(Arc::new(index), Arc::new(gateway), RetryPolicy::default());
    App::new(listing, workers)
}

/// Feeds worker events into the app until `done` holds or the deadline passes.
pub fn pump_until(app: &mut App, mut done: impl FnMut(&App) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(app) {
        assert!(Instant::now() < deadline, "timed out waiting for workers");
        if let Some(evt) = app.workers.recv_timeout(Duration::from_millis(50)) {
            app.on_worker_event(evt);
        }
    }
}

pub fn record(cid: &str) -> FileRecord {
    FileRecord {
        cid: cid.to_string(),
        file_size: 2048,
        replicas: 3,
        block_timestamp: 1_700_000_000,
        memo: None,
    }
}

/// Index with a fixed page list per address. Pages past the end come back empty.
#[derive(Default)]
pub struct FakeIndex {
    pages: HashMap<String, Vec<Result<ListingPage, IndexError>>>,
    pub calls: Mutex<Vec<(String, u32)>>,
}

impl FakeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// `sizes[i]` records on page `i`, all reporting `total`.
    pub fn with_pages(mut self, address: &str, sizes: &[usize], total: u64) -> Self {
        let mut n = 0;
        let pages = sizes
            .iter()
            .map(|&size| {
                let files = (0..size)
                    .map(|_| {
                        n += 1;
                        record(&format!("Qm{address}{n:04}"))
                    })
                    .collect::<Vec<_>>();
                Ok(ListingPage {
                    has_more: !files.is_empty(),
                    files,
                    total_count: total,
                })
            })
            .collect();
        self.pages.insert(address.to_string(), pages);
        self
    }

    pub fn with_error_at(mut self, address: &str, page: usize, err: IndexError) -> Self {
        if let Some(pages) = self.pages.get_mut(address) {
            if page < pages.len() {
                pages[page] = Err(err);
            } else {
                pages.push(Err(err));
            }
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl IndexSource for FakeIndex {
    fn fetch_files(&self, address: &str, page: u32) -> Result<ListingPage, IndexError> {
        self.calls.lock().unwrap().push((address.to_string(), page));
        self.pages
            .get(address)
            .and_then(|p| p.get(page as usize))
            .cloned()
            .unwrap_or_else(|| Ok(ListingPage::default()))
    }
}

/// Gateway serving fixed bodies, with scripted failures for the ranged fetch.
#[derive(Default)]
pub struct FakeGateway {
    types: HashMap<String, String>,
    bodies: HashMap<String, Vec<u8>>,
    failures: Mutex<VecDeque<GatewayError>>,
    image_loads_fail: bool,
    pub head_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, cid: &str, content_type: &str, body: &[u8]) -> Self {
        self.types.insert(cid.to_string(), content_type.to_string());
        self.bodies.insert(cid.to_string(), body.to_vec());
        self
    }

    /// The next `n` ranged fetches fail with a timeout.
    pub fn failing(self, n: usize) -> Self {
        {
            let mut f = self.failures.lock().unwrap();
            for _ in 0..n {
                f.push_back(GatewayError::Timeout);
            }
        }
        self
    }

    pub fn image_loads_fail(mut self) -> Self {
        self.image_loads_fail = true;
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl ContentSource for FakeGateway {
    fn content_url(&self, cid: &str) -> String {
        format!("https://gw.test/ipfs/{cid}")
    }

    fn head_info(&self, cid: &str) -> Option<HeadInfo> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let ct = self.types.get(cid)?;
        Some(HeadInfo {
            content_type: Some(ct.clone()),
            content_length: self.bodies.get(cid).map(|b| b.len() as u64),
            status: 200,
        })
    }

    fn ranged_content(&self, cid: &str, max_bytes: usize) -> Option<RangedContent> {
        let body = self.bodies.get(cid)?;
        Some(RangedContent {
            data: body.iter().take(max_bytes).copied().collect(),
            content_type: self.types.get(cid).cloned(),
            content_length: Some(body.len() as u64),
        })
    }

    fn fetch_preview_bytes(
        &self,
        cid: &str,
        max_bytes: usize,
        _timeout: Duration,
    ) -> Result<RangedContent, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.ranged_content(cid, max_bytes)
            .ok_or(GatewayError::Status(404))
    }

    fn load_image(&self, cid: &str, _timeout: Duration) -> Result<String, GatewayError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.image_loads_fail {
            return Err(GatewayError::Timeout);
        }
        match self.types.get(cid) {
            Some(ct) if ct.starts_with("image/") => Ok(self.content_url(cid)),
            Some(ct) => Err(GatewayError::NotImage(ct.clone())),
            None => Err(GatewayError::Status(404)),
        }
    }
}
