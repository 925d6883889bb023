//! Funnel event recording, impression tracking and product-analytics dispatch

mod collector;
mod dispatcher;
mod error;
mod events;
mod impressions;
mod recorder;
mod scheduler;
mod sink;

pub use collector::{Collector, CollectorEvent, NoopCollector, PlausibleCollector, Props};
pub use dispatcher::EventDispatcher;
pub use error::{CollectorError, SinkError};
pub use events::TrackedEvent;
pub use impressions::{
    ElementId, HeadlessWatcher, ImpressionTracker, IntersectionEntry, Observation,
    ViewportWatcher, WatcherFactory, WatcherOptions,
};
pub use recorder::FunnelTracker;
pub use scheduler::{Debouncer, Scheduled, Scheduler};
pub use sink::{FunnelSink, JsonlSink, MemorySink, SupabaseSink};
