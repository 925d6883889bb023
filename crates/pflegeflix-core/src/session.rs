//! Sliding-expiry session identity

use pflegeflix_telemetry::{KeyValueStore, SessionRecord, StoreError};
use rand::Rng;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub const SESSION_ID_PREFIX: &str = "sess_";

const RANDOM_SUFFIX_LEN: usize = 9;

/// Wall clock in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub trait SessionStore: Send + Sync {
    /// Stored record, or `None` when absent or unreadable
    fn load(&self) -> Option<SessionRecord>;

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;
}

/// Session record kept as JSON under one key of a [`KeyValueStore`]
pub struct KvSessionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl KvSessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl SessionStore for KvSessionStore {
    fn load(&self) -> Option<SessionRecord> {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "session storage unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(key = %self.key, error = %e, "discarding corrupt session record");
                None
            }
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record).map_err(std::io::Error::from)?;
        self.store.set(&self.key, &json)
    }
}

/// Hands out the current session id, refreshing or rotating it as needed
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
    guard: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            guard: Mutex::new(()),
        }
    }

    /// Return the live session id, touching it; mint a new one if absent or idle past the TTL
    pub fn get_or_create_session_id(&self) -> String {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now_ms();

        let record = match self.store.load() {
            Some(existing) if self.is_live(&existing, now) => SessionRecord {
                id: existing.id,
                timestamp: now,
            },
            _ => {
                let record = SessionRecord {
                    id: new_session_id(now),
                    timestamp: now,
                };
                tracing::debug!(session_id = %record.id, "started new session");
                record
            }
        };

        if let Err(e) = self.store.save(&record) {
            tracing::warn!(error = %e, "failed to persist session record");
        }
        record.id
    }

    /// Touched within the TTL; timestamps in the future or out of range count as stale
    fn is_live(&self, record: &SessionRecord, now: i64) -> bool {
        now.checked_sub(record.timestamp)
            .is_some_and(|idle| (0..self.ttl_ms).contains(&idle))
    }
}

fn new_session_id(now_ms: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
        .collect();
    format!("{SESSION_ID_PREFIX}{now_ms}_{suffix}")
}
