//! Product-analytics collectors

use async_trait::async_trait;
use pflegeflix_core::CollectorConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::CollectorError;

/// Flat property bag attached to a product event
pub type Props = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectorEvent {
    pub name: String,
    pub url: String,
    pub referrer: Option<String>,
    pub props: Props,
    #[serde(skip)]
    pub user_agent: String,
}

/// External collector. Loading is idempotent; sending requires a prior load.
#[async_trait]
pub trait Collector: Send + Sync {
    fn is_loaded(&self) -> bool;

    fn ensure_loaded(&self) -> Result<(), CollectorError>;

    /// Best-effort release of whatever `ensure_loaded` set up
    fn unload(&self) {}

    async fn send(&self, event: &CollectorEvent) -> Result<(), CollectorError>;
}

#[derive(Serialize)]
struct EventBody<'a> {
    name: &'a str,
    url: &'a str,
    domain: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    referrer: Option<&'a str>,
    #[serde(skip_serializing_if = "no_props")]
    props: &'a Props,
}

fn no_props(props: &&Props) -> bool {
    props.is_empty()
}

/// Plausible-compatible events API
pub struct PlausibleCollector {
    config: CollectorConfig,
    timeout: Duration,
    client: Mutex<Option<reqwest::Client>>,
}

impl PlausibleCollector {
    /// Each send gives up after `timeout`
    pub fn new(config: CollectorConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            client: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/event", self.config.api_host.trim_end_matches('/'))
    }

    fn client(&self) -> Option<reqwest::Client> {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Collector for PlausibleCollector {
    fn is_loaded(&self) -> bool {
        self.client().is_some()
    }

    fn ensure_loaded(&self) -> Result<(), CollectorError> {
        if self.config.domain.trim().is_empty() {
            return Err(CollectorError::NotConfigured("empty domain".to_string()));
        }

        let mut client = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        if client.is_none() {
            tracing::debug!(domain = %self.config.domain, "loading analytics collector");
            *client = Some(reqwest::Client::builder().timeout(self.timeout).build()?);
        }
        Ok(())
    }

    fn unload(&self) {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    async fn send(&self, event: &CollectorEvent) -> Result<(), CollectorError> {
        let client = self.client().ok_or(CollectorError::NotLoaded)?;
        let body = EventBody {
            name: &event.name,
            url: &event.url,
            domain: &self.config.domain,
            referrer: event.referrer.as_deref(),
            props: &event.props,
        };

        let response = client
            .post(self.endpoint())
            .header("User-Agent", &event.user_agent)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CollectorError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

/// Collector that accepts and discards everything
#[derive(Debug, Default)]
pub struct NoopCollector {
    loaded: AtomicBool,
}

impl NoopCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Collector for NoopCollector {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn ensure_loaded(&self) -> Result<(), CollectorError> {
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn unload(&self) {
        self.loaded.store(false, Ordering::SeqCst);
    }

    async fn send(&self, event: &CollectorEvent) -> Result<(), CollectorError> {
        tracing::trace!(name = %event.name, "discarding product event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plausible(domain: &str) -> PlausibleCollector {
        PlausibleCollector::new(
            CollectorConfig {
                domain: domain.to_string(),
                api_host: "https://plausible.io/".to_string(),
            },
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_load_is_idempotent() {
        let collector = plausible("pflegeflix.de");
        assert!(!collector.is_loaded());
        collector.ensure_loaded().unwrap();
        collector.ensure_loaded().unwrap();
        assert!(collector.is_loaded());
        assert_eq!(collector.endpoint(), "https://plausible.io/api/event");

        collector.unload();
        assert!(!collector.is_loaded());
    }

    #[test]
    fn test_empty_domain_never_loads() {
        let collector = plausible("  ");
        assert!(matches!(
            collector.ensure_loaded(),
            Err(CollectorError::NotConfigured(_))
        ));
        assert!(!collector.is_loaded());
    }

    #[tokio::test]
    async fn test_send_before_load_fails() {
        let collector = plausible("pflegeflix.de");
        let event = CollectorEvent {
            name: "Job Search".to_string(),
            url: "https://pflegeflix.de/jobs".to_string(),
            referrer: None,
            props: Props::new(),
            user_agent: "test".to_string(),
        };
        assert!(matches!(
            collector.send(&event).await,
            Err(CollectorError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn test_send_gives_up_on_silent_collector() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let collector = PlausibleCollector::new(
            CollectorConfig {
                domain: "pflegeflix.de".to_string(),
                api_host: format!("http://{}", listener.local_addr().unwrap()),
            },
            Duration::from_millis(200),
        );
        collector.ensure_loaded().unwrap();

        let event = CollectorEvent {
            name: "Job Search".to_string(),
            url: "https://pflegeflix.de/jobs".to_string(),
            referrer: None,
            props: Props::new(),
            user_agent: "test".to_string(),
        };
        let err = collector.send(&event).await.unwrap_err();
        assert!(matches!(err, CollectorError::Http(ref e) if e.is_timeout()), "{err}");
    }

    #[test]
    fn test_event_body_shape() {
        let mut props = Props::new();
        props.insert("city".to_string(), serde_json::json!("Köln"));
        let body = EventBody {
            name: "Job Search",
            url: "https://pflegeflix.de/jobs",
            domain: "pflegeflix.de",
            referrer: None,
            props: &props,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["domain"], "pflegeflix.de");
        assert_eq!(json["props"]["city"], "Köln");
        assert!(json.get("referrer").is_none());
    }
}
