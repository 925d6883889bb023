//! Funnel event recorder

use pflegeflix_core::{
    classify_device, utm_params, ConsentProvider, Filters, FunnelEvent, FunnelEventType,
    PageEnvironment, SessionManager, TrackerConfig,
};
use std::sync::Arc;

use crate::impressions::{ImpressionTracker, WatcherFactory};
use crate::scheduler::{Scheduled, Scheduler};
use crate::sink::FunnelSink;

struct Inner {
    config: TrackerConfig,
    consent: Arc<dyn ConsentProvider>,
    sessions: Arc<SessionManager>,
    page: Arc<dyn PageEnvironment>,
    sink: Arc<dyn FunnelSink>,
    scheduler: Scheduler,
}

/// Records job-listing funnel events, best-effort.
///
/// None of the tracking methods can fail: consent denial and bad input are
/// silent no-ops and sink failures are logged and dropped.
#[derive(Clone)]
pub struct FunnelTracker {
    inner: Arc<Inner>,
}

impl FunnelTracker {
    pub fn new(
        config: TrackerConfig,
        consent: Arc<dyn ConsentProvider>,
        sessions: Arc<SessionManager>,
        page: Arc<dyn PageEnvironment>,
        sink: Arc<dyn FunnelSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                consent,
                sessions,
                page,
                sink,
                scheduler: Scheduler::new(),
            }),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    pub fn has_consent(&self) -> bool {
        self.inner.consent.has_consent()
    }

    /// Assemble the row for one emission from the current session and page
    pub fn build_event(
        &self,
        event_type: FunnelEventType,
        job_id: &str,
        employer_id: &str,
        filters: Option<Filters>,
    ) -> FunnelEvent {
        let page = &self.inner.page;
        let location = page.location();
        let utm = utm_params(&location);

        FunnelEvent {
            event_type,
            job_id: job_id.to_string(),
            employer_id: employer_id.to_string(),
            user_id: page.user_id(),
            session_id: self.inner.sessions.get_or_create_session_id(),
            referrer: page.referrer().filter(|r| !r.is_empty()),
            device: classify_device(&page.user_agent()),
            locale: page.locale(),
            source: location.path().to_string(),
            utm_source: utm.utm_source,
            utm_medium: utm.utm_medium,
            utm_campaign: utm.utm_campaign,
            filters_snapshot: filters,
        }
    }

    pub async fn track_funnel_event(
        &self,
        event_type: FunnelEventType,
        job_id: &str,
        employer_id: &str,
        filters: Option<Filters>,
    ) {
        if !self.has_consent() {
            tracing::debug!(%event_type, job_id, "no analytics consent, skipping funnel event");
            return;
        }
        if job_id.is_empty() || employer_id.is_empty() {
            tracing::debug!(%event_type, job_id, employer_id, "missing job or employer id, skipping funnel event");
            return;
        }

        let event = self.build_event(event_type, job_id, employer_id, filters);
        match self.inner.sink.insert(&event).await {
            Ok(()) => tracing::debug!(%event_type, job_id, session_id = %event.session_id, "funnel event recorded"),
            Err(e) => tracing::error!(%event_type, job_id, error = %e, "failed to record funnel event"),
        }
    }

    pub async fn track_list_click(&self, job_id: &str, employer_id: &str, filters: Option<Filters>) {
        self.track_funnel_event(FunnelEventType::ListClick, job_id, employer_id, filters)
            .await;
    }

    /// Record a detail view once the user has stayed for the configured dwell time.
    /// Cancel the returned handle when the view goes away to drop the bounce.
    pub fn track_detail_view(
        &self,
        job_id: &str,
        employer_id: &str,
        filters: Option<Filters>,
    ) -> Scheduled {
        let tracker = self.clone();
        let job_id = job_id.to_string();
        let employer_id = employer_id.to_string();

        self.inner
            .scheduler
            .schedule(self.inner.config.detail_view_delay(), async move {
                tracker
                    .track_funnel_event(FunnelEventType::DetailView, &job_id, &employer_id, filters)
                    .await;
            })
    }

    pub async fn track_apply_open(&self, job_id: &str, employer_id: &str, filters: Option<Filters>) {
        self.track_funnel_event(FunnelEventType::ApplyOpen, job_id, employer_id, filters)
            .await;
    }

    pub async fn track_apply_submit(
        &self,
        job_id: &str,
        employer_id: &str,
        filters: Option<Filters>,
    ) {
        self.track_funnel_event(FunnelEventType::ApplySubmit, job_id, employer_id, filters)
            .await;
    }

    /// New impression tracker for one view, sharing this recorder
    pub fn impressions(&self, factory: WatcherFactory) -> ImpressionTracker {
        ImpressionTracker::new(self.clone(), factory)
    }

    /// Cancel every pending detail view
    pub fn shutdown(&self) {
        self.inner.scheduler.cancel_all();
    }
}
