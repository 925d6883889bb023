//! Consent gate
//!
//! Every tracking path asks a [`ConsentProvider`] first. Only an explicit
//! `"analytics": true` in the stored consent record unlocks tracking; anything
//! else, including storage errors and corrupt JSON, reads as "no consent".

use pflegeflix_telemetry::{ConsentRecord, KeyValueStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait ConsentProvider: Send + Sync {
    fn has_consent(&self) -> bool;
}

/// True only when `raw` is a JSON object whose `analytics` member is `true`
pub fn parse_analytics_consent(raw: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v.get("analytics").and_then(|a| a.as_bool()))
        .unwrap_or(false)
}

/// Reads the consent record from client-local storage on every call
pub struct StoredConsent {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl StoredConsent {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl ConsentProvider for StoredConsent {
    fn has_consent(&self) -> bool {
        match self.store.get(&self.key) {
            Ok(Some(raw)) => parse_analytics_consent(&raw),
            Ok(None) => false,
            Err(e) => {
                tracing::debug!(key = %self.key, error = %e, "consent unreadable, treating as denied");
                false
            }
        }
    }
}

/// Consent answer held in memory, for hosts that resolve consent themselves
#[derive(Debug, Default)]
pub struct FixedConsent {
    granted: AtomicBool,
}

impl FixedConsent {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    pub fn set(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

impl ConsentProvider for FixedConsent {
    fn has_consent(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }
}

/// Persist a consent record the way the consent banner does
pub fn write_consent(
    store: &dyn KeyValueStore,
    key: &str,
    record: &ConsentRecord,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(record).map_err(std::io::Error::from)?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pflegeflix_telemetry::MemoryStore;

    const KEY: &str = "cookie_consent";

    fn gate_for(raw: Option<&str>) -> StoredConsent {
        let store = match raw {
            Some(raw) => MemoryStore::with_entry(KEY, raw),
            None => MemoryStore::new(),
        };
        StoredConsent::new(Arc::new(store), KEY)
    }

    #[test]
    fn test_denied_without_explicit_analytics_true() {
        for raw in [
            None,
            Some("{}"),
            Some("not json"),
            Some(r#"{"analytics":false}"#),
            Some(r#"{"analytics":"true"}"#),
            Some(r#"{"analytics":1}"#),
            Some("[true]"),
            Some(""),
        ] {
            assert!(!gate_for(raw).has_consent(), "{raw:?} must not grant consent");
        }
    }

    #[test]
    fn test_granted_with_analytics_true() {
        assert!(gate_for(Some(r#"{"analytics":true}"#)).has_consent());
        assert!(gate_for(Some(r#"{"analytics":true,"marketing":false,"necessary":true}"#)).has_consent());
    }

    #[test]
    fn test_withdrawal_applies_on_next_call() {
        let store = Arc::new(MemoryStore::new());
        let gate = StoredConsent::new(store.clone(), KEY);

        write_consent(store.as_ref(), KEY, &ConsentRecord { analytics: true, marketing: false }).unwrap();
        assert!(gate.has_consent());

        write_consent(store.as_ref(), KEY, &ConsentRecord::default()).unwrap();
        assert!(!gate.has_consent());
    }

    #[test]
    fn test_fixed_consent_toggle() {
        let gate = FixedConsent::new(false);
        assert!(!gate.has_consent());
        gate.set(true);
        assert!(gate.has_consent());
    }
}
