//! Tracking record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Active search filters captured alongside a funnel event
pub type Filters = BTreeMap<String, serde_json::Value>;

/// Funnel stage of a job listing, in funnel order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelEventType {
    Impression,
    ListClick,
    DetailView,
    ApplyOpen,
    ApplySubmit,
}

impl FunnelEventType {
    pub const ALL: [FunnelEventType; 5] = [
        Self::Impression,
        Self::ListClick,
        Self::DetailView,
        Self::ApplyOpen,
        Self::ApplySubmit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Impression => "impression",
            Self::ListClick => "list_click",
            Self::DetailView => "detail_view",
            Self::ApplyOpen => "apply_open",
            Self::ApplySubmit => "apply_submit",
        }
    }
}

impl fmt::Display for FunnelEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunnelEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown funnel event type: {s}"))
    }
}

/// Coarse device class derived from the user agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Tablet,
    Mobile,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
        })
    }
}

/// One row of the `job_funnel_events` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelEvent {
    pub event_type: FunnelEventType,
    pub job_id: String,
    pub employer_id: String,
    pub user_id: Option<String>,
    pub session_id: String,
    pub referrer: Option<String>,
    pub device: DeviceType,
    pub locale: String,
    pub source: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters_snapshot: Option<Filters>,
}

/// A funnel event as written to the local JSONL log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedFunnelEvent {
    pub logged_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: FunnelEvent,
}

/// Rolling session identity persisted in client-local storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    /// Last-touched epoch milliseconds
    pub timestamp: i64,
}

/// Cookie consent choices written by the consent banner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub marketing: bool,
}
