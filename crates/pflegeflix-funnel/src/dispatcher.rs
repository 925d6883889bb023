//! Product-analytics dispatch, gated by consent

use pflegeflix_core::{ConsentProvider, PageEnvironment};
use std::sync::Arc;
use url::Url;

use crate::collector::{Collector, CollectorEvent, Props};
use crate::events::TrackedEvent;

const PAGEVIEW: &str = "pageview";

/// Forwards product events to the collector. Never fails: missing consent or
/// an unloaded collector are no-ops, send errors are logged.
pub struct EventDispatcher {
    consent: Arc<dyn ConsentProvider>,
    collector: Arc<dyn Collector>,
    page: Arc<dyn PageEnvironment>,
}

impl EventDispatcher {
    pub fn new(
        consent: Arc<dyn ConsentProvider>,
        collector: Arc<dyn Collector>,
        page: Arc<dyn PageEnvironment>,
    ) -> Self {
        Self {
            consent,
            collector,
            page,
        }
    }

    /// Load the collector once consent allows it. Returns whether it is loaded.
    pub fn mount(&self) -> bool {
        if !self.consent.has_consent() {
            tracing::debug!("no analytics consent, collector not loaded");
            return false;
        }
        if self.collector.is_loaded() {
            return true;
        }
        match self.collector.ensure_loaded() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "analytics collector failed to load");
                false
            }
        }
    }

    pub fn unmount(&self) {
        self.collector.unload();
    }

    pub async fn track_event(&self, event: TrackedEvent, props: Props) {
        let url = self.page.location();
        self.dispatch(event.name(), url, props).await;
    }

    /// Report a page view for `path` (resolved against the current location), or the current page
    pub async fn track_page_view(&self, path: Option<&str>) {
        let location = self.page.location();
        let url = match path {
            Some(path) => location.join(path).unwrap_or_else(|e| {
                tracing::warn!(path, error = %e, "unresolvable page path, using current location");
                location.clone()
            }),
            None => location,
        };
        self.dispatch(PAGEVIEW, url, Props::new()).await;
    }

    async fn dispatch(&self, name: &str, url: Url, props: Props) {
        if !self.consent.has_consent() {
            tracing::debug!(name, "no analytics consent, skipping product event");
            return;
        }
        if !self.collector.is_loaded() {
            tracing::warn!(name, "analytics collector not loaded, dropping event");
            return;
        }

        let event = CollectorEvent {
            name: name.to_string(),
            url: url.to_string(),
            referrer: self.page.referrer(),
            props,
            user_agent: self.page.user_agent(),
        };
        if let Err(e) = self.collector.send(&event).await {
            tracing::error!(name, error = %e, "failed to send product event");
        }
    }
}
