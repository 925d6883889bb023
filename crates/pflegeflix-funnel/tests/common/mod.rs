#![allow(dead_code)]

use async_trait::async_trait;
use pflegeflix_core::{
    FixedConsent, FunnelEvent, KvSessionStore, PageState, SessionManager, SystemClock,
    TrackerConfig,
};
use pflegeflix_funnel::{
    Collector, CollectorError, CollectorEvent, FunnelSink, FunnelTracker, MemorySink, SinkError,
};
use pflegeflix_telemetry::MemoryStore;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const JOBS_URL: &str = "https://pflegeflix.de/jobs?utm_source=newsletter";
pub const DESKTOP_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct Harness {
    pub tracker: FunnelTracker,
    pub sink: Arc<MemorySink>,
    pub consent: Arc<FixedConsent>,
    pub page: Arc<PageState>,
}

pub fn harness(consent: bool) -> Harness {
    harness_with_sink(consent, Arc::new(MemorySink::new()))
}

pub fn harness_with_sink(consent: bool, sink: Arc<MemorySink>) -> Harness {
    let (tracker, consent, page) = build(consent, sink.clone());
    Harness {
        tracker,
        sink,
        consent,
        page,
    }
}

pub fn build(
    consent: bool,
    sink: Arc<dyn FunnelSink>,
) -> (FunnelTracker, Arc<FixedConsent>, Arc<PageState>) {
    let config = TrackerConfig::new();
    let sessions = SessionManager::new(
        Arc::new(KvSessionStore::new(
            Arc::new(MemoryStore::new()),
            &config.session_key,
        )),
        Arc::new(SystemClock),
        config.session_ttl(),
    );
    let consent = Arc::new(FixedConsent::new(consent));
    let page = Arc::new(PageState::parse(JOBS_URL, DESKTOP_UA, "de-DE").unwrap());
    let tracker = FunnelTracker::new(
        config,
        consent.clone(),
        Arc::new(sessions),
        page.clone(),
        sink,
    );
    (tracker, consent, page)
}

/// Sink whose inserts are always rejected
#[derive(Default)]
pub struct FailingSink {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl FunnelSink for FailingSink {
    async fn insert(&self, _event: &FunnelEvent) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Rejected {
            status: 403,
            body: "new row violates row-level security policy".to_string(),
        })
    }
}

/// Collector that remembers what it was sent
#[derive(Default)]
pub struct RecordingCollector {
    pub loaded: AtomicBool,
    pub loads: AtomicUsize,
    pub fail_sends: AtomicBool,
    pub sent: Mutex<Vec<CollectorEvent>>,
}

impl RecordingCollector {
    pub fn sent(&self) -> Vec<CollectorEvent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Collector for RecordingCollector {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn ensure_loaded(&self) -> Result<(), CollectorError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn unload(&self) {
        self.loaded.store(false, Ordering::SeqCst);
    }

    async fn send(&self, event: &CollectorEvent) -> Result<(), CollectorError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(CollectorError::Rejected { status: 500 });
        }
        self.sent.lock().unwrap().push(event.clone());
        Ok(())
    }
}
