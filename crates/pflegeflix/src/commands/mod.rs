pub mod consent;
pub mod device;
pub mod event;
pub mod history;
pub mod replay;
pub mod session;
pub mod track;
pub mod version;

use anyhow::Context;
use pflegeflix_core::{
    Filters, KvSessionStore, PageState, SessionManager, StoredConsent, SystemClock, TrackerConfig,
};
use pflegeflix_funnel::{FunnelSink, FunnelTracker, JsonlSink, SupabaseSink};
use pflegeflix_telemetry::{FileStore, Paths};
use std::sync::Arc;

/// Local storage, config and sinks rooted at one state directory
pub(crate) struct LocalState {
    pub paths: Paths,
    pub config: TrackerConfig,
    pub store: Arc<FileStore>,
}

impl LocalState {
    pub fn load() -> anyhow::Result<Self> {
        let paths = Paths::new()?;
        let config = TrackerConfig::load_or_default(&paths.config_file());
        Ok(Self::new(paths, config))
    }

    pub fn new(paths: Paths, config: TrackerConfig) -> Self {
        let store = Arc::new(FileStore::new(paths.storage_dir()));
        Self {
            paths,
            config,
            store,
        }
    }

    pub fn consent(&self) -> Arc<StoredConsent> {
        Arc::new(StoredConsent::new(
            self.store.clone(),
            &self.config.consent_key,
        ))
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        let store = KvSessionStore::new(self.store.clone(), &self.config.session_key);
        Arc::new(SessionManager::new(
            Arc::new(store),
            Arc::new(SystemClock),
            self.config.session_ttl(),
        ))
    }

    pub fn page(&self, url: Option<&str>, user_agent: Option<&str>) -> anyhow::Result<Arc<PageState>> {
        let url = url.unwrap_or(&self.config.site_url);
        let default_ua = format!("pflegeflix-cli/{}", env!("CARGO_PKG_VERSION"));
        let page = PageState::parse(
            url,
            user_agent.unwrap_or(&default_ua),
            &self.config.default_locale,
        )
        .with_context(|| format!("invalid page URL {url:?}"))?;
        Ok(Arc::new(page))
    }

    /// Hosted backend when configured, otherwise the local JSONL log
    pub fn sink(&self) -> anyhow::Result<Arc<dyn FunnelSink>> {
        Ok(match &self.config.backend {
            Some(backend) => Arc::new(
                SupabaseSink::new(backend, self.config.request_timeout())
                    .context("failed to build backend client")?,
            ),
            None => Arc::new(JsonlSink::new(self.paths.funnel_log())),
        })
    }

    pub fn funnel(&self, page: Arc<PageState>) -> anyhow::Result<FunnelTracker> {
        Ok(FunnelTracker::new(
            self.config.clone(),
            self.consent(),
            self.sessions(),
            page,
            self.sink()?,
        ))
    }
}

pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

/// Parse repeated `key=value` arguments; values that are valid JSON keep their type
pub(crate) fn parse_pairs(pairs: &[String]) -> anyhow::Result<Filters> {
    let mut parsed = Filters::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value, got {pair:?}"))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("empty key in {pair:?}");
        }
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        parsed.insert(key.to_string(), value);
    }
    Ok(parsed)
}

#[cfg(test)]
pub(crate) fn temp_state() -> (tempfile::TempDir, LocalState) {
    let dir = tempfile::TempDir::new().unwrap();
    let state = LocalState::new(Paths::with_root(dir.path()), TrackerConfig::new());
    (dir, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs_types() {
        let pairs = vec![
            "city=Berlin".to_string(),
            "radius_km=25".to_string(),
            "remote=true".to_string(),
            "query=a=b".to_string(),
        ];
        let parsed = parse_pairs(&pairs).unwrap();
        assert_eq!(parsed["city"], "Berlin");
        assert_eq!(parsed["radius_km"], 25);
        assert_eq!(parsed["remote"], true);
        assert_eq!(parsed["query"], "a=b");
    }

    #[test]
    fn test_parse_pairs_rejects_malformed() {
        assert!(parse_pairs(&["novalue".to_string()]).is_err());
        assert!(parse_pairs(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_sink_falls_back_to_local_log() {
        let (_dir, state) = temp_state();
        // No backend configured: events go to funnel_events.jsonl
        assert!(state.sink().is_ok());
        assert!(state.config.backend.is_none());
        assert!(state.page(Some("not a url"), None).is_err());
        assert!(state.page(None, None).is_ok());
    }
}
