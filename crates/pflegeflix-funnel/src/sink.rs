//! Destinations for funnel events

use async_trait::async_trait;
use pflegeflix_core::BackendConfig;
use pflegeflix_telemetry::{append_jsonl, FunnelEvent, LoggedFunnelEvent};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::SinkError;

/// Single-row insert of a funnel event
#[async_trait]
pub trait FunnelSink: Send + Sync {
    async fn insert(&self, event: &FunnelEvent) -> Result<(), SinkError>;
}

/// PostgREST insert into the hosted `job_funnel_events` table
pub struct SupabaseSink {
    client: reqwest::Client,
    endpoint: String,
    anon_key: String,
}

impl SupabaseSink {
    /// Every insert gives up after `timeout`
    pub fn new(config: &BackendConfig, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/rest/v1/{}",
                config.url.trim_end_matches('/'),
                config.table
            ),
            anon_key: config.anon_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FunnelSink for SupabaseSink {
    async fn insert(&self, event: &FunnelEvent) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "return=minimal")
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Appends events to a local JSONL log, stamped with the write time
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FunnelSink for JsonlSink {
    async fn insert(&self, event: &FunnelEvent) -> Result<(), SinkError> {
        let logged = LoggedFunnelEvent {
            logged_at: chrono::Utc::now(),
            event: event.clone(),
        };
        append_jsonl(&self.path, &logged)?;
        Ok(())
    }
}

/// Keeps inserted events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<FunnelEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FunnelEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FunnelSink for MemorySink {
    async fn insert(&self, event: &FunnelEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}
