//! Consent, session identity and page context for funnel tracking

mod config;
mod consent;
mod context;
mod device;
mod error;
mod session;

pub use config::{BackendConfig, CollectorConfig, TrackerConfig};
pub use consent::{parse_analytics_consent, write_consent, ConsentProvider, FixedConsent, StoredConsent};
pub use context::{utm_params, PageEnvironment, PageState, UtmParams};
pub use device::classify_device;
pub use error::CoreError;
pub use session::{
    Clock, KvSessionStore, ManualClock, SessionManager, SessionStore, SystemClock,
    SESSION_ID_PREFIX,
};

pub use pflegeflix_telemetry::{DeviceType, Filters, FunnelEvent, FunnelEventType};
