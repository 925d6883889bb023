mod common;

use common::{RecordingCollector, DESKTOP_UA};
use pflegeflix_core::{FixedConsent, PageState};
use pflegeflix_funnel::{EventDispatcher, Props, TrackedEvent};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn dispatcher(consent: bool) -> (EventDispatcher, Arc<RecordingCollector>, Arc<FixedConsent>) {
    let collector = Arc::new(RecordingCollector::default());
    let consent = Arc::new(FixedConsent::new(consent));
    let page = PageState::parse("https://pflegeflix.de/jobs?q=pflege", DESKTOP_UA, "de-DE").unwrap();
    page.set_referrer(Some("https://www.bing.com/".to_string()));
    let dispatcher = EventDispatcher::new(consent.clone(), collector.clone(), Arc::new(page));
    (dispatcher, collector, consent)
}

#[tokio::test]
async fn test_mount_loads_collector_once() {
    let (dispatcher, collector, _) = dispatcher(true);

    assert!(dispatcher.mount());
    assert!(dispatcher.mount());
    assert_eq!(collector.loads.load(Ordering::SeqCst), 1);

    dispatcher.unmount();
    assert!(!collector.loaded.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_mount_without_consent_does_not_load() {
    let (dispatcher, collector, _) = dispatcher(false);
    assert!(!dispatcher.mount());
    assert_eq!(collector.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_event_forwarded_with_props() {
    let (dispatcher, collector, _) = dispatcher(true);
    dispatcher.mount();

    let mut props = Props::new();
    props.insert("city".to_string(), serde_json::json!("Leipzig"));
    dispatcher.track_event(TrackedEvent::JobSearch, props).await;

    let sent = collector.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, "Job Search");
    assert_eq!(sent[0].url, "https://pflegeflix.de/jobs?q=pflege");
    assert_eq!(sent[0].referrer.as_deref(), Some("https://www.bing.com/"));
    assert_eq!(sent[0].props["city"], "Leipzig");
}

#[tokio::test]
async fn test_page_view_resolves_path() {
    let (dispatcher, collector, _) = dispatcher(true);
    dispatcher.mount();

    dispatcher.track_page_view(Some("/arbeitgeber")).await;
    dispatcher.track_page_view(None).await;

    let sent = collector.sent();
    assert_eq!(sent[0].name, "pageview");
    assert_eq!(sent[0].url, "https://pflegeflix.de/arbeitgeber");
    assert_eq!(sent[1].url, "https://pflegeflix.de/jobs?q=pflege");
}

#[tokio::test]
async fn test_gated_and_unloaded_are_no_ops() {
    let (dispatcher, collector, consent) = dispatcher(true);

    // Not mounted yet
    dispatcher.track_event(TrackedEvent::JobSaved, Props::new()).await;
    assert!(collector.sent().is_empty());

    dispatcher.mount();
    consent.set(false);
    dispatcher.track_event(TrackedEvent::JobSaved, Props::new()).await;
    assert!(collector.sent().is_empty());

    consent.set(true);
    dispatcher.track_event(TrackedEvent::JobSaved, Props::new()).await;
    assert_eq!(collector.sent().len(), 1);
}

#[tokio::test]
async fn test_send_failure_is_swallowed() {
    let (dispatcher, collector, _) = dispatcher(true);
    dispatcher.mount();
    collector.fail_sends.store(true, Ordering::SeqCst);

    dispatcher.track_event(TrackedEvent::ApplicationSubmitted, Props::new()).await;
    assert!(collector.sent().is_empty());
}
