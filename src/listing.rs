use crate::cache::FileCache;
use crate::error::IndexError;
use crate::index::IndexSource;
use crate::prefs::Prefs;
use crate::types::{FileRecord, ListingPage};
use tracing::{info, warn};

/// A page fetch the controller has committed to. Results must be handed back
/// through [`ListingController::finish_page`] with the same request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub session: u64,
    pub address: String,
    pub page: u32,
}

/// Drives incremental loading of a single address.
///
/// Each submit starts a new session. Pages are fetched one at a time; a result
/// from an older session is ignored.
pub struct ListingController {
    cache: FileCache,
    prefs: Prefs,

    session: u64,
    address: Option<String>,
    files: Vec<FileRecord>,
    page: u32,
    has_more: bool,
    total_count: u64,
    loading: bool,
    error: Option<String>,
    // Set by a failed fetch; the tail-visible trigger stays quiet until an
    // explicit retry or a new submit.
    stalled: bool,
}

impl ListingController {
    pub fn new(cache: FileCache, prefs: Prefs) -> Self {
        Self {
            cache,
            prefs,
            session: 0,
            address: None,
            files: Vec::new(),
            page: 0,
            has_more: true,
            total_count: 0,
            loading: false,
            error: None,
            stalled: false,
        }
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Starts a fresh session for `input`. Returns false for blank input.
    ///
    /// The address goes to the history and the last-used slot; both writes are
    /// best-effort.
    pub fn submit(&mut self, input: &str) -> bool {
        let address = input.trim();
        if address.is_empty() {
            return false;
        }

        if let Err(e) = self.prefs.set_last_address(address) {
            warn!(error = %e, "failed to persist last address");
        }
        self.cache.add_to_history(address);

        self.session = self.session.wrapping_add(1);
        self.address = Some(address.to_string());
        self.files.clear();
        self.page = 0;
        self.has_more = true;
        self.total_count = 0;
        self.loading = false;
        self.error = None;
        self.stalled = false;

        info!(address = %address, session = self.session, "new listing session");
        true
    }

    /// Re-submits the address remembered from the previous run, if any.
    pub fn restore(&mut self) -> bool {
        match self.prefs.last_address().map(str::to_string) {
            Some(addr) => self.submit(&addr),
            None => false,
        }
    }

    /// Commits to fetching the page at the cursor. `None` when there is no
    /// address, nothing more to load, a fetch already in flight, or the session
    /// is stalled on an error.
    pub fn begin_page(&mut self) -> Option<PageRequest> {
        let address = self.address.clone()?;
        if !self.has_more || self.loading || self.stalled {
            return None;
        }
        self.loading = true;
        Some(PageRequest {
            session: self.session,
            address,
            page: self.page,
        })
    }

    /// Visibility trigger: the last rendered file came into view.
    pub fn on_tail_visible(&mut self) -> Option<PageRequest> {
        self.begin_page()
    }

    /// Explicit retry after a failed fetch. Re-requests the same page.
    pub fn retry(&mut self) -> Option<PageRequest> {
        if !self.stalled {
            return None;
        }
        self.stalled = false;
        self.error = None;
        self.begin_page()
    }

    /// Merges the outcome of `req`. Returns false if the request belongs to a
    /// previous session and was ignored.
    pub fn finish_page(&mut self, req: &PageRequest, result: Result<ListingPage, IndexError>) -> bool {
        if req.session != self.session {
            return false;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                if req.page == 0 {
                    self.total_count = page.total_count;
                }
                for record in &page.files {
                    if let Err(e) = self.cache.save_file(record) {
                        warn!(cid = %record.cid, error = %e, "failed to mirror file record");
                    }
                }
                self.has_more = !page.files.is_empty();
                info!(
                    page = req.page,
                    received = page.files.len(),
                    total = self.total_count,
                    "page loaded"
                );
                self.files.extend(page.files);
                self.page = req.page + 1;
            }
            Err(e) => {
                warn!(page = req.page, error = %e, "page fetch failed");
                self.error = Some(format!("Error fetching files: {}. Press r to retry.", e));
                self.stalled = true;
            }
        }
        true
    }

    /// Synchronous begin + fetch + finish. Returns whether a request was made.
    pub fn load_next_page(&mut self, index: &dyn IndexSource) -> bool {
        let Some(req) = self.begin_page() else {
            return false;
        };
        let result = index.fetch_files(&req.address, req.page);
        self.finish_page(&req, result);
        true
    }

    /// "Found N files. Showing M so far." once a total is known.
    pub fn summary(&self) -> Option<String> {
        if self.total_count == 0 {
            return None;
        }
        Some(format!(
            "Found {} files. Showing {} so far.",
            self.total_count,
            self.files.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn controller() -> ListingController {
        ListingController::new(FileCache::new(Arc::new(MemoryStore::new())), Prefs::in_memory())
    }

    fn page(cids: &[&str], total: u64) -> ListingPage {
        ListingPage {
            files: cids
                .iter()
                .map(|c| FileRecord {
                    cid: c.to_string(),
                    file_size: 1,
                    replicas: 1,
                    block_timestamp: 1,
                    memo: None,
                })
                .collect(),
            total_count: total,
            has_more: !cids.is_empty(),
        }
    }

    #[test]
    fn blank_submit_is_noop() {
        let mut c = controller();
        assert!(!c.submit("   "));
        assert!(c.address().is_none());
        assert!(c.begin_page().is_none());
    }

    #[test]
    fn single_flight() {
        let mut c = controller();
        c.submit("addr");
        let req = c.begin_page().unwrap();
        assert_eq!(req.page, 0);
        assert!(c.begin_page().is_none());
        assert!(c.on_tail_visible().is_none());
        c.finish_page(&req, Ok(page(&["a"], 5)));
        assert_eq!(c.begin_page().unwrap().page, 1);
    }

    #[test]
    fn stale_session_result_is_ignored() {
        let mut c = controller();
        c.submit("addr");
        let old = c.begin_page().unwrap();
        c.submit("addr");
        assert!(!c.finish_page(&old, Ok(page(&["a", "b"], 2))));
        assert!(c.files().is_empty());
        assert!(!c.is_loading());
    }

    #[test]
    fn total_only_from_first_page() {
        let mut c = controller();
        c.submit("addr");
        let r0 = c.begin_page().unwrap();
        c.finish_page(&r0, Ok(page(&["a"], 3)));
        let r1 = c.begin_page().unwrap();
        c.finish_page(&r1, Ok(page(&["b"], 99)));
        assert_eq!(c.total_count(), 3);
        assert_eq!(c.summary().as_deref(), Some("Found 3 files. Showing 2 so far."));
    }

    #[test]
    fn error_stalls_until_retry() {
        let mut c = controller();
        c.submit("addr");
        let r0 = c.begin_page().unwrap();
        c.finish_page(&r0, Err(IndexError::Status(502)));

        assert!(c.error().is_some());
        assert!(c.is_stalled());
        assert!(c.has_more());
        assert_eq!(c.page(), 0);
        assert!(c.on_tail_visible().is_none());

        let again = c.retry().unwrap();
        assert_eq!(again.page, 0);
        assert!(c.error().is_none());
    }

    #[test]
    fn retry_without_error_does_nothing() {
        let mut c = controller();
        c.submit("addr");
        assert!(c.retry().is_none());
        assert!(!c.is_loading());
    }

    #[test]
    fn submit_persists_last_address() {
        let mut c = controller();
        c.submit("  cTxyz  ");
        assert_eq!(c.address(), Some("cTxyz"));
        assert_eq!(c.prefs.last_address(), Some("cTxyz"));
        assert_eq!(c.cache().history(), vec!["cTxyz".to_string()]);
    }
}
