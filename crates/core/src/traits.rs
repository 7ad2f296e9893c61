// Collaborator traits
//
// The record store only reads from these collaborators (join sources and
// enumerations) or emits to them (calendar). Each can be absent; callers
// treat a missing collaborator as an empty list or a skipped side effect.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opportunity as seen by the join layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub opportunity_id: String,
    pub opportunity_name: String,
}

impl Opportunity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            opportunity_id: id.into(),
            opportunity_name: name.into(),
        }
    }
}

/// Company as seen by the join layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub company_id: String,
    pub company_name: String,
}

impl Company {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            company_id: id.into(),
            company_name: name.into(),
        }
    }
}

/// One entry of a system-config enumeration (event types, stages, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOption {
    pub value: String,
    pub label: String,
}

impl ConfigOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// System-config category holding event type labels
pub const EVENT_TYPE_CATEGORY: &str = "event_type";

/// Calendar entry emitted when an event is created with calendar sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[async_trait]
pub trait OpportunitySource: Send + Sync {
    async fn list_opportunities(&self) -> anyhow::Result<Vec<Opportunity>>;
}

#[async_trait]
pub trait CompanySource: Send + Sync {
    async fn list_companies(&self) -> anyhow::Result<Vec<Company>>;
}

#[async_trait]
pub trait SystemConfigSource: Send + Sync {
    /// Ordered options of one category; unknown categories yield an empty list
    async fn options(&self, category: &str) -> anyhow::Result<Vec<ConfigOption>>;
}

#[async_trait]
pub trait CalendarSink: Send + Sync {
    async fn create_calendar_event(&self, event: CalendarEvent) -> anyhow::Result<()>;
}
