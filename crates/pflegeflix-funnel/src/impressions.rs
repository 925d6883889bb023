//! Viewport impressions for job cards
//!
//! One [`ImpressionTracker`] belongs to one view. It lazily creates a single
//! [`ViewportWatcher`] shared by every card it tracks, debounces visibility
//! flicker per job, and reports each job at most once for its lifetime.

use pflegeflix_core::{Filters, FunnelEventType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::recorder::FunnelTracker;
use crate::scheduler::Debouncer;

/// Host-assigned identity of a rendered job card
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatcherOptions {
    /// Visible fraction at which the watcher reports an element
    pub threshold: f64,
    pub root_margin: String,
}

/// Host-side visibility watcher, one per tracker
pub trait ViewportWatcher: Send {
    fn observe(&mut self, element: ElementId);

    fn unobserve(&mut self, element: ElementId);

    fn disconnect(&mut self);
}

pub type WatcherFactory = Box<dyn Fn(&WatcherOptions) -> Box<dyn ViewportWatcher> + Send + Sync>;

/// One visibility change reported by the watcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionEntry {
    pub element: ElementId,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

/// Watcher for hosts that compute visibility themselves and feed
/// [`ImpressionTracker::on_intersection`] directly
#[derive(Debug, Clone, Default)]
pub struct HeadlessWatcher {
    observed: Arc<Mutex<BTreeSet<ElementId>>>,
}

impl HeadlessWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observed(&self) -> Vec<ElementId> {
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    /// Factory handing out clones that share this watcher's observed set
    pub fn factory(&self) -> WatcherFactory {
        let watcher = self.clone();
        Box::new(move |_: &WatcherOptions| -> Box<dyn ViewportWatcher> {
            Box::new(watcher.clone())
        })
    }
}

impl ViewportWatcher for HeadlessWatcher {
    fn observe(&mut self, element: ElementId) {
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(element);
    }

    fn unobserve(&mut self, element: ElementId) {
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&element);
    }

    fn disconnect(&mut self) {
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[derive(Debug, Clone)]
struct CardMeta {
    job_id: String,
    employer_id: String,
    filters: Option<Filters>,
}

#[derive(Default)]
struct Cards {
    watcher: Option<Box<dyn ViewportWatcher>>,
    by_element: HashMap<ElementId, CardMeta>,
}

struct Inner {
    funnel: FunnelTracker,
    factory: WatcherFactory,
    options: WatcherOptions,
    cards: Mutex<Cards>,
    reported: Arc<Mutex<HashSet<String>>>,
    debouncer: Debouncer<String>,
}

#[derive(Clone)]
pub struct ImpressionTracker {
    inner: Arc<Inner>,
}

impl ImpressionTracker {
    pub fn new(funnel: FunnelTracker, factory: WatcherFactory) -> Self {
        let config = funnel.config();
        let options = WatcherOptions {
            threshold: config.impression_threshold,
            root_margin: "0px".to_string(),
        };
        let debouncer = Debouncer::new(config.impression_debounce());

        Self {
            inner: Arc::new(Inner {
                funnel,
                factory,
                options,
                cards: Mutex::new(Cards::default()),
                reported: Arc::new(Mutex::new(HashSet::new())),
                debouncer,
            }),
        }
    }

    /// Start watching a card; the metadata is read back when it becomes visible
    pub fn track(
        &self,
        element: ElementId,
        job_id: &str,
        employer_id: &str,
        filters: Option<Filters>,
    ) -> Observation {
        let mut cards = self.lock_cards();
        let inner = &self.inner;
        let watcher = cards
            .watcher
            .get_or_insert_with(|| (inner.factory)(&inner.options));
        watcher.observe(element);

        let previous = cards.by_element.insert(
            element,
            CardMeta {
                job_id: job_id.to_string(),
                employer_id: employer_id.to_string(),
                filters,
            },
        );
        // A recycled card no longer shows its old job
        if let Some(previous) = previous.filter(|p| p.job_id != job_id) {
            self.cancel_if_unshown(&cards, &previous);
        }

        Observation {
            tracker: self.clone(),
            element,
        }
    }

    /// Feed watcher callbacks. Cards at or above the threshold start (or
    /// restart) their job's debounce unless the job was already reported.
    pub fn on_intersection(&self, entries: &[IntersectionEntry]) {
        for entry in entries {
            if !entry.is_intersecting || entry.intersection_ratio < self.inner.options.threshold {
                continue;
            }

            let Some(card) = self.lock_cards().by_element.get(&entry.element).cloned() else {
                tracing::debug!(element = %entry.element, "intersection for untracked element");
                continue;
            };

            if self.is_reported(&card.job_id) {
                continue;
            }

            let funnel = self.inner.funnel.clone();
            let reported = self.inner.reported.clone();
            let key = card.job_id.clone();
            self.inner.debouncer.call(key, async move {
                if !funnel.has_consent() {
                    tracing::debug!(job_id = %card.job_id, "no analytics consent, impression not reported");
                    return;
                }
                let first = reported
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(card.job_id.clone());
                if first {
                    funnel
                        .track_funnel_event(
                            FunnelEventType::Impression,
                            &card.job_id,
                            &card.employer_id,
                            card.filters,
                        )
                        .await;
                }
            });
        }
    }

    /// Stop watching one card and drop its pending impression
    pub fn untrack(&self, element: ElementId) {
        let mut cards = self.lock_cards();
        let Some(card) = cards.by_element.remove(&element) else {
            return;
        };
        if let Some(watcher) = cards.watcher.as_mut() {
            watcher.unobserve(element);
        }
        self.cancel_if_unshown(&cards, &card);
    }

    /// Drop `card`'s pending impression unless another tracked card shows the same job
    fn cancel_if_unshown(&self, cards: &Cards, card: &CardMeta) {
        let job_still_shown = cards.by_element.values().any(|c| c.job_id == card.job_id);
        if !job_still_shown {
            self.inner.debouncer.cancel(&card.job_id);
        }
    }

    /// Tear down: disconnect the watcher, forget all cards and cancel pending impressions.
    /// Jobs already reported stay reported.
    pub fn untrack_all(&self) {
        let mut cards = self.lock_cards();
        if let Some(mut watcher) = cards.watcher.take() {
            watcher.disconnect();
        }
        cards.by_element.clear();
        self.inner.debouncer.cancel_all();
    }

    pub fn is_reported(&self, job_id: &str) -> bool {
        self.inner
            .reported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(job_id)
    }

    pub fn tracked_count(&self) -> usize {
        self.lock_cards().by_element.len()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.debouncer.pending()
    }

    fn lock_cards(&self) -> std::sync::MutexGuard<'_, Cards> {
        self.inner
            .cards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A tracked card; `unobserve` detaches it from the shared watcher
#[must_use = "dropping an Observation keeps the card tracked; call unobserve on unmount"]
pub struct Observation {
    tracker: ImpressionTracker,
    element: ElementId,
}

impl Observation {
    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn unobserve(self) {
        self.tracker.untrack(self.element);
    }
}
