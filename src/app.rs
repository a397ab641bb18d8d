use crate::listing::ListingController;
use crate::logging::LogEntry;
use crate::preview::PreviewSlot;
use crate::tabs::TabId;
use crate::worker::{WorkerEvent, Workers};
use std::collections::{HashMap, VecDeque};
use std::io;
use tracing::{debug, info, warn};

/// Hands a URL to a browser.
pub type UrlOpener = Box<dyn Fn(&str) -> io::Result<()>>;

fn system_browser(url: &str) -> io::Result<()> {
    webbrowser::open(url)
}

pub struct App {
    pub should_quit: bool,
    pub active_tab: TabId,

    pub listing: ListingController,
    pub previews: HashMap<String, PreviewSlot>,
    next_preview_id: u64,

    pub history: Vec<String>,
    pub input: String,

    pub logs: VecDeque<LogEntry>,
    pub logs_max: usize,

    pub workers: Workers,
    pub open_url: UrlOpener,

    pub ui: UiState,
}

impl App {
    pub fn new(listing: ListingController, workers: Workers) -> Self {
        let history = listing.cache().history();
        Self {
            should_quit: false,
            active_tab: TabId::Browse,
            listing,
            previews: HashMap::new(),
            next_preview_id: 0,
            history,
            input: String::new(),
            logs: VecDeque::new(),
            logs_max: 5000,
            workers,
            open_url: Box::new(system_browser),
            ui: UiState::default(),
        }
    }

    pub fn set_active_tab(&mut self, tab: TabId) {
        self.active_tab = tab;
    }

    pub fn push_log(&mut self, entry: LogEntry) {
        self.logs.push_back(entry);
        while self.logs.len() > self.logs_max {
            self.logs.pop_front();
        }
    }

    /// Submits `address` and kicks off page 0.
    pub fn submit(&mut self, address: &str) -> bool {
        if !self.listing.submit(address) {
            return false;
        }
        self.input = address.trim().to_string();
        self.history = self.listing.cache().history();
        // Rows of the previous session are gone, so are their previews.
        self.previews.clear();
        if let Some(req) = self.listing.begin_page() {
            self.workers.spawn_page(req);
        }
        true
    }

    pub fn submit_input(&mut self) -> bool {
        let input = self.input.clone();
        self.submit(&input)
    }

    /// Start-up: restore the last submitted address, if one was saved.
    pub fn restore(&mut self) -> bool {
        if !self.listing.restore() {
            return false;
        }
        if let Some(addr) = self.listing.address() {
            self.input = addr.to_string();
        }
        self.history = self.listing.cache().history();
        if let Some(req) = self.listing.begin_page() {
            self.workers.spawn_page(req);
        }
        true
    }

    pub fn on_tail_visible(&mut self) {
        if let Some(req) = self.listing.on_tail_visible() {
            self.workers.spawn_page(req);
        }
    }

    pub fn retry_page(&mut self) {
        if let Some(req) = self.listing.retry() {
            self.workers.spawn_page(req);
        }
    }

    pub fn clear_history(&mut self) {
        self.listing.cache().clear_history();
        self.history.clear();
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_preview_id = self.next_preview_id.wrapping_add(1);
        self.next_preview_id
    }

    /// Starts preview resolution for rows that just became visible and have
    /// none yet.
    pub fn ensure_previews<'a>(&mut self, cids: impl IntoIterator<Item = &'a str>) {
        for cid in cids {
            if self.previews.contains_key(cid) {
                continue;
            }
            let id = self.next_request_id();
            self.previews.insert(cid.to_string(), PreviewSlot::new(id));
            self.workers.spawn_preview(id, cid.to_string());
        }
    }

    /// Explicit refresh of one preview, whatever state it is in.
    pub fn refresh_preview(&mut self, cid: &str) {
        let id = self.next_request_id();
        self.previews
            .entry(cid.to_string())
            .or_insert_with(|| PreviewSlot::new(id))
            .refresh(id);
        self.workers.spawn_preview(id, cid.to_string());
    }

    pub fn on_worker_event(&mut self, evt: WorkerEvent) {
        match evt {
            WorkerEvent::Page { request, result } => {
                if !self.listing.finish_page(&request, result) {
                    debug!(page = request.page, "dropping page from superseded session");
                }
            }
            WorkerEvent::Preview {
                request_id,
                cid,
                state,
            } => {
                if let Some(slot) = self.previews.get_mut(&cid) {
                    slot.apply(request_id, state);
                }
            }
        }
    }

    pub fn poll_workers(&mut self) {
        for evt in self.workers.drain() {
            self.on_worker_event(evt);
        }
    }

    pub fn gateway_url(&self, cid: &str) -> String {
        self.workers.content().content_url(cid)
    }

    /// Opens the gateway URL of `cid` in the system browser. Returns whether
    /// the browser could be launched.
    pub fn open_in_browser(&self, cid: &str) -> bool {
        let url = self.gateway_url(cid);
        match (self.open_url)(&url) {
            Ok(()) => {
                info!(url = %url, "opened in browser");
                true
            }
            Err(e) => {
                warn!(url = %url, error = %e, "failed to open browser");
                false
            }
        }
    }
}

#[derive(Default)]
pub struct UiState {
    // Populated on each draw pass.
    pub tab_hitboxes: Vec<TabHitbox>,
    /// True while the address input has keyboard focus; global single-key
    /// binds are disabled then.
    pub editing: bool,
}

#[derive(Debug, Clone)]
pub struct TabHitbox {
    pub tab: TabId,
    pub x0: u16,
    pub x1: u16,
    pub y0: u16,
    pub y1: u16,
}
