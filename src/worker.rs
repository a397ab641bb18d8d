use crate::error::IndexError;
use crate::gateway::ContentSource;
use crate::index::IndexSource;
use crate::listing::PageRequest;
use crate::preview::{PreviewResolver, PreviewState, RetryPolicy};
use crate::types::ListingPage;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Result messages sent from background threads to the UI thread.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Page {
        request: PageRequest,
        result: Result<ListingPage, IndexError>,
    },
    Preview {
        request_id: u64,
        cid: String,
        state: PreviewState,
    },
}

/// Spawns short-lived threads for network work and collects their results.
///
/// Nothing is cancelled: a result nobody wants any more is dropped on receipt.
pub struct Workers {
    index: Arc<dyn IndexSource>,
    content: Arc<dyn ContentSource>,
    policy: RetryPolicy,
    tx: Sender<WorkerEvent>,
    rx: Receiver<WorkerEvent>,
}

impl Workers {
    pub fn new(
        index: Arc<dyn IndexSource>,
        content: Arc<dyn ContentSource>,
        policy: RetryPolicy,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            index,
            content,
            policy,
            tx,
            rx,
        }
    }

    pub fn content(&self) -> &Arc<dyn ContentSource> {
        &self.content
    }

    pub fn spawn_page(&self, request: PageRequest) {
        let index = Arc::clone(&self.index);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = index.fetch_files(&request.address, request.page);
            let _ = tx.send(WorkerEvent::Page { request, result });
        });
    }

    pub fn spawn_preview(&self, request_id: u64, cid: String) {
        let content = Arc::clone(&self.content);
        let policy = self.policy;
        let tx = self.tx.clone();
        thread::spawn(move || {
            let resolver = PreviewResolver::new(content.as_ref(), policy);
            let progress_tx = tx.clone();
            let progress_cid = cid.clone();
            let state = resolver.resolve(&cid, None, |s| {
                let _ = progress_tx.send(WorkerEvent::Preview {
                    request_id,
                    cid: progress_cid.clone(),
                    state: s.clone(),
                });
            });
            let _ = tx.send(WorkerEvent::Preview {
                request_id,
                cid,
                state,
            });
        });
    }

    /// Everything that arrived since the last call.
    pub fn drain(&self) -> Vec<WorkerEvent> {
        let mut out = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            out.push(evt);
        }
        out
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorkerEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}
