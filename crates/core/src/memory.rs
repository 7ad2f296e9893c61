// In-memory collaborator implementations for examples and testing
//
// These keep everything in memory and can be switched into a failing mode to
// exercise the degrade-on-join-failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::traits::{
    CalendarEvent, CalendarSink, Company, CompanySource, ConfigOption, Opportunity,
    OpportunitySource, SystemConfigSource,
};

// ============================================================================
// InMemoryDirectory - opportunities and companies
// ============================================================================

/// In-memory opportunity and company lists
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    opportunities: RwLock<Vec<Opportunity>>,
    companies: RwLock<Vec<Company>>,
    failing: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_opportunity(&self, id: &str, name: &str) {
        self.opportunities.write().push(Opportunity::new(id, name));
    }

    pub fn add_company(&self, id: &str, name: &str) {
        self.companies.write().push(Company::new(id, name));
    }

    /// Make every subsequent read fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl OpportunitySource for InMemoryDirectory {
    async fn list_opportunities(&self) -> anyhow::Result<Vec<Opportunity>> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("opportunity source unavailable");
        }
        Ok(self.opportunities.read().clone())
    }
}

#[async_trait]
impl CompanySource for InMemoryDirectory {
    async fn list_companies(&self) -> anyhow::Result<Vec<Company>> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("company source unavailable");
        }
        Ok(self.companies.read().clone())
    }
}

// ============================================================================
// StaticSystemConfig
// ============================================================================

/// Fixed system-config enumerations
#[derive(Debug, Default)]
pub struct StaticSystemConfig {
    categories: RwLock<HashMap<String, Vec<ConfigOption>>>,
}

impl StaticSystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(self, category: &str, options: Vec<ConfigOption>) -> Self {
        self.categories.write().insert(category.to_string(), options);
        self
    }
}

#[async_trait]
impl SystemConfigSource for StaticSystemConfig {
    async fn options(&self, category: &str) -> anyhow::Result<Vec<ConfigOption>> {
        Ok(self
            .categories
            .read()
            .get(category)
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// RecordingCalendar
// ============================================================================

/// Calendar sink that records what it was sent
#[derive(Debug, Default)]
pub struct RecordingCalendar {
    events: RwLock<Vec<CalendarEvent>>,
    failing: AtomicBool,
}

impl RecordingCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let calendar = Self::default();
        calendar.failing.store(true, Ordering::SeqCst);
        calendar
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.read().clone()
    }
}

#[async_trait]
impl CalendarSink for RecordingCalendar {
    async fn create_calendar_event(&self, event: CalendarEvent) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("calendar rejected event '{}'", event.summary);
        }
        self.events.write().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_directory_failing_mode() {
        let directory = InMemoryDirectory::new();
        directory.add_company("CMP1", "Acme");
        assert_eq!(directory.list_companies().await.unwrap().len(), 1);

        directory.set_failing(true);
        assert!(directory.list_companies().await.is_err());
        assert!(directory.list_opportunities().await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_config_category_is_empty() {
        let config = StaticSystemConfig::new()
            .with_options("event_type", vec![ConfigOption::new("iot", "IoT Visit")]);
        assert_eq!(config.options("event_type").await.unwrap().len(), 1);
        assert!(config.options("stage").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recording_calendar() {
        let calendar = RecordingCalendar::new();
        let now = Utc::now();
        calendar
            .create_calendar_event(CalendarEvent {
                summary: "Visit".into(),
                description: String::new(),
                start: now,
                end: now,
            })
            .await
            .unwrap();
        assert_eq!(calendar.events().len(), 1);
    }
}
