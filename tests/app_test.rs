mod common;

use common::{app, pump_until, FakeGateway, FakeIndex};
use crust_browser::preview::{ContentKind, PreviewStatus};
use crust_browser::worker::WorkerEvent;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[test]
fn submit_loads_first_page_in_background() {
    let mut app = app(
        FakeIndex::new().with_pages("cTaddr", &[4, 2], 6),
        FakeGateway::new(),
    );
    assert!(app.submit("  cTaddr "));
    assert_eq!(app.input, "cTaddr");
    assert_eq!(app.history, vec!["cTaddr".to_string()]);
    assert!(app.listing.is_loading());

    pump_until(&mut app, |a| !a.listing.is_loading());
    assert_eq!(app.listing.files().len(), 4);
    assert_eq!(app.listing.total_count(), 6);

    app.on_tail_visible();
    pump_until(&mut app, |a| !a.listing.is_loading());
    assert_eq!(app.listing.files().len(), 6);

    // Trailing empty page ends the listing.
    app.on_tail_visible();
    pump_until(&mut app, |a| !a.listing.is_loading());
    assert!(!app.listing.has_more());
    assert_eq!(
        app.listing.summary().as_deref(),
        Some("Found 6 files. Showing 6 so far.")
    );
}

#[test]
fn blank_submit_does_nothing() {
    let mut app = app(FakeIndex::new(), FakeGateway::new());
    assert!(!app.submit("   "));
    assert!(!app.listing.is_loading());
    assert!(app.history.is_empty());
}

#[test]
fn results_of_old_session_are_dropped() {
    let mut app = app(
        FakeIndex::new()
            .with_pages("first", &[3], 3)
            .with_pages("second", &[1], 1),
        FakeGateway::new(),
    );
    app.submit("first");
    app.submit("second");

    // Both fetches report back; only the current session's page is merged.
    let mut seen = 0;
    let deadline = Instant::now() + Duration::from_secs(5);
    while seen < 2 {
        assert!(Instant::now() < deadline, "timed out waiting for workers");
        if let Some(evt) = app.workers.recv_timeout(Duration::from_millis(50)) {
            if matches!(evt, WorkerEvent::Page { .. }) {
                seen += 1;
            }
            app.on_worker_event(evt);
        }
    }
    assert_eq!(app.listing.address(), Some("second"));
    assert_eq!(app.listing.files().len(), 1);
    assert!(app.listing.files()[0].cid.starts_with("Qmsecond"));
}

#[test]
fn visible_rows_get_previews_once() {
    let mut app = app(
        FakeIndex::new(),
        FakeGateway::new()
            .with_file("QmA", "text/plain", b"alpha")
            .with_file("QmB", "image/png", b"png"),
    );
    app.ensure_previews(["QmA", "QmB"]);
    let first_ids: Vec<u64> = ["QmA", "QmB"]
        .iter()
        .map(|c| app.previews[*c].request_id)
        .collect();

    // A second visibility pass must not restart anything.
    app.ensure_previews(["QmA", "QmB"]);
    let again: Vec<u64> = ["QmA", "QmB"]
        .iter()
        .map(|c| app.previews[*c].request_id)
        .collect();
    assert_eq!(first_ids, again);

    pump_until(&mut app, |a| a.previews.values().all(|s| s.state.is_terminal()));
    let a = &app.previews["QmA"].state;
    assert_eq!(a.content_kind, ContentKind::Text);
    assert_eq!(a.payload.as_deref(), Some("alpha"));
    let b = &app.previews["QmB"].state;
    assert_eq!(b.content_kind, ContentKind::Image);
    assert_eq!(b.payload.as_deref(), Some("https://gw.test/ipfs/QmB"));
}

#[test]
fn refresh_restarts_a_finished_preview() {
    let mut app = app(
        FakeIndex::new(),
        FakeGateway::new().with_file("QmA", "text/plain", b"alpha"),
    );
    app.ensure_previews(["QmA"]);
    pump_until(&mut app, |a| a.previews["QmA"].state.is_terminal());
    let old_id = app.previews["QmA"].request_id;

    app.refresh_preview("QmA");
    assert_ne!(app.previews["QmA"].request_id, old_id);
    assert_eq!(app.previews["QmA"].state.status, PreviewStatus::Loading);
    assert_eq!(app.previews["QmA"].state.retry_count, 0);

    pump_until(&mut app, |a| a.previews["QmA"].state.is_terminal());
    assert_eq!(app.previews["QmA"].state.status, PreviewStatus::Ready);
}

#[test]
fn new_submit_clears_previews() {
    let mut app = app(
        FakeIndex::new().with_pages("cTaddr", &[1], 1),
        FakeGateway::new().with_file("QmA", "text/plain", b"alpha"),
    );
    app.ensure_previews(["QmA"]);
    app.submit("cTaddr");
    assert!(app.previews.is_empty());
}

#[test]
fn clear_history_empties_list() {
    let mut app = app(FakeIndex::new(), FakeGateway::new());
    app.submit("A");
    app.submit("B");
    assert_eq!(app.history.len(), 2);
    app.clear_history();
    assert!(app.history.is_empty());
    assert!(app.listing.cache().history().is_empty());
}

#[test]
fn open_in_browser_uses_gateway_url() {
    let mut app = app(FakeIndex::new(), FakeGateway::new());
    let opened = Arc::new(Mutex::new(Vec::new()));
    let sink = opened.clone();
    app.open_url = Box::new(move |url: &str| {
        sink.lock().unwrap().push(url.to_string());
        Ok(())
    });

    assert!(app.open_in_browser("QmA"));
    assert_eq!(*opened.lock().unwrap(), vec!["https://gw.test/ipfs/QmA".to_string()]);

    app.open_url =
        Box::new(|_: &str| Err(io::Error::new(io::ErrorKind::NotFound, "no browser")));
    assert!(!app.open_in_browser("QmA"));
}
