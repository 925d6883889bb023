//! Tracker configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::CoreError;

/// Hosted backend that receives funnel events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

/// Product-analytics collector endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Site domain the collector attributes events to
    pub domain: String,
    #[serde(default = "default_api_host")]
    pub api_host: String,
}

fn default_table() -> String {
    "job_funnel_events".to_string()
}

fn default_api_host() -> String {
    "https://plausible.io".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Inactivity window after which a session expires
    pub session_ttl_ms: u64,

    /// Minimum dwell before a detail view counts
    pub detail_view_delay_ms: u64,

    /// Quiet period coalescing visibility flicker into one impression
    pub impression_debounce_ms: u64,

    /// Visible fraction of a card that counts as an impression
    pub impression_threshold: f64,

    /// Upper bound on one backend or collector request
    pub request_timeout_ms: u64,

    pub consent_key: String,
    pub session_key: String,
    pub default_locale: String,

    /// Base URL used when a host has no real page location
    pub site_url: String,

    pub backend: Option<BackendConfig>,
    pub collector: Option<CollectorConfig>,
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self {
            session_ttl_ms: 30 * 60 * 1000,
            detail_view_delay_ms: 2000,
            impression_debounce_ms: 500,
            impression_threshold: 0.5,
            request_timeout_ms: 5000,
            consent_key: "cookie_consent".to_string(),
            session_key: "pf_session".to_string(),
            default_locale: "de-DE".to_string(),
            site_url: "https://pflegeflix.de".to_string(),
            backend: None,
            collector: None,
        }
    }

    /// Parse a config file; fields it omits keep their defaults
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load `path` if it exists and parses, otherwise defaults, then apply env overrides
    pub fn load_or_default(path: &Path) -> Self {
        let mut config = if path.exists() {
            match Self::load(path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable tracking config");
                    Self::new()
                }
            }
        } else {
            Self::new()
        };
        config.apply_env();
        config
    }

    /// Override backend and collector settings from `PFLEGEFLIX_*` variables
    pub fn apply_env(&mut self) {
        let url = std::env::var("PFLEGEFLIX_SUPABASE_URL").ok();
        let key = std::env::var("PFLEGEFLIX_SUPABASE_ANON_KEY").ok();
        if let (Some(url), Some(anon_key)) = (url, key) {
            let table = self
                .backend
                .as_ref()
                .map(|b| b.table.clone())
                .unwrap_or_else(default_table);
            self.backend = Some(BackendConfig {
                url,
                anon_key,
                table,
            });
        }

        if let Ok(domain) = std::env::var("PFLEGEFLIX_ANALYTICS_DOMAIN") {
            let api_host = self
                .collector
                .as_ref()
                .map(|c| c.api_host.clone())
                .unwrap_or_else(default_api_host);
            self.collector = Some(CollectorConfig { domain, api_host });
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_millis(self.session_ttl_ms)
    }

    pub fn detail_view_delay(&self) -> Duration {
        Duration::from_millis(self.detail_view_delay_ms)
    }

    pub fn impression_debounce(&self) -> Duration {
        Duration::from_millis(self.impression_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new()
    }
}
