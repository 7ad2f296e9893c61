// Event service: presentation reads and mutation entry points
//
// Reads fetch the record set and the join sources concurrently, then attach
// opportunity/company display names to copies of the records. The cached
// record set is never touched. Reads never fail: store or join failures are
// logged and degrade to an empty list or an unenriched record.
//
// Mutations go through the repository (create, delete) or the migration
// coordinator (update) and propagate their errors.

use std::collections::HashMap;
use std::sync::Arc;

use eventsheet_core::{
    CompanySource, ConfigOption, EventPatch, EventQuery, EventRecord, EventType, NewEvent,
    OpportunitySource, Result, StoreError, SystemConfigSource, EVENT_TYPE_CATEGORY,
};
use eventsheet_storage::{EventRepository, MigrationCoordinator, SavedEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// An event with display names for its references
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    #[serde(flatten)]
    pub event: EventRecord,
    /// Opportunity display name; the raw id when no opportunity matches
    pub opportunity_name: Option<String>,
    /// Company display name; the raw id when no company matches
    pub company_name: Option<String>,
    pub event_type_label: String,
}

impl EventView {
    /// The record without display names, labelled with its built-in type label
    pub fn raw(event: EventRecord) -> Self {
        let event_type_label = event.event_type().default_label().to_string();
        Self {
            event,
            opportunity_name: None,
            company_name: None,
            event_type_label,
        }
    }
}

/// Display names for one batch of records
#[derive(Debug, Default)]
struct JoinContext {
    opportunities: HashMap<String, String>,
    companies: HashMap<String, String>,
    type_labels: HashMap<EventType, String>,
}

impl JoinContext {
    fn view(&self, event: EventRecord) -> EventView {
        let opportunity_name = display_name(&self.opportunities, &event.opportunity_id);
        let company_name = display_name(&self.companies, &event.company_id);
        let event_type_label = type_label(&self.type_labels, event.event_type());
        EventView {
            event,
            opportunity_name,
            company_name,
            event_type_label,
        }
    }
}

fn display_name(names: &HashMap<String, String>, id: &str) -> Option<String> {
    if id.is_empty() {
        return None;
    }
    Some(names.get(id).cloned().unwrap_or_else(|| id.to_string()))
}

fn type_label(labels: &HashMap<EventType, String>, event_type: EventType) -> String {
    labels
        .get(&event_type)
        .cloned()
        .unwrap_or_else(|| event_type.default_label().to_string())
}

/// Presentation and mutation entry points for events
pub struct EventService {
    repo: Arc<EventRepository>,
    coordinator: MigrationCoordinator,
    opportunities: Option<Arc<dyn OpportunitySource>>,
    companies: Option<Arc<dyn CompanySource>>,
    system_config: Option<Arc<dyn SystemConfigSource>>,
}

impl EventService {
    pub fn new(repo: Arc<EventRepository>) -> Self {
        Self {
            coordinator: MigrationCoordinator::new(repo.clone()),
            repo,
            opportunities: None,
            companies: None,
            system_config: None,
        }
    }

    pub fn with_opportunities(mut self, source: Arc<dyn OpportunitySource>) -> Self {
        self.opportunities = Some(source);
        self
    }

    pub fn with_companies(mut self, source: Arc<dyn CompanySource>) -> Self {
        self.companies = Some(source);
        self
    }

    pub fn with_system_config(mut self, source: Arc<dyn SystemConfigSource>) -> Self {
        self.system_config = Some(source);
        self
    }

    pub fn repository(&self) -> &Arc<EventRepository> {
        &self.repo
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// One event by id, archived included
    ///
    /// Returns the raw record (no display names) if the join sources fail, and
    /// None if the record is missing or the store cannot be read.
    pub async fn get_event(&self, event_id: &str) -> Option<EventView> {
        let (record, join) = tokio::join!(self.repo.get_by_id(event_id), self.load_join());
        let record = match record {
            Ok(record) => record?,
            Err(e) => {
                warn!(%event_id, error = %e, "failed to read event");
                return None;
            }
        };
        match join {
            Ok(join) => Some(join.view(record)),
            Err(e) => {
                warn!(%event_id, error = %e, "join sources unavailable, returning raw event");
                Some(EventView::raw(record))
            }
        }
    }

    /// Filtered listing with display names, newest first
    ///
    /// Empty when the store or a join source fails.
    pub async fn list_events(&self, query: &EventQuery) -> Vec<EventView> {
        let (records, join) = tokio::join!(self.repo.list(query), self.load_join());
        let records = match records {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "failed to list events");
                return Vec::new();
            }
        };
        match join {
            Ok(join) => records.into_iter().map(|r| join.view(r)).collect(),
            Err(e) => {
                warn!(error = %e, "join sources unavailable, returning no events");
                Vec::new()
            }
        }
    }

    pub async fn list_for_opportunity(&self, opportunity_id: &str) -> Vec<EventView> {
        self.list_events(&EventQuery::for_opportunity(opportunity_id))
            .await
    }

    pub async fn list_for_company(&self, company_id: &str) -> Vec<EventView> {
        self.list_events(&EventQuery::for_company(company_id)).await
    }

    /// Event type choices for forms; built-in labels when none are configured
    pub async fn event_type_options(&self) -> Vec<ConfigOption> {
        let labels = self.type_labels().await;
        EventType::ALL
            .iter()
            .map(|t| ConfigOption::new(t.as_str(), type_label(&labels, *t)))
            .collect()
    }

    async fn load_join(&self) -> anyhow::Result<JoinContext> {
        let (opportunities, companies, type_labels) = tokio::join!(
            async {
                match &self.opportunities {
                    Some(source) => source.list_opportunities().await,
                    None => Ok(Vec::new()),
                }
            },
            async {
                match &self.companies {
                    Some(source) => source.list_companies().await,
                    None => Ok(Vec::new()),
                }
            },
            self.type_labels(),
        );

        Ok(JoinContext {
            opportunities: opportunities?
                .into_iter()
                .map(|o| (o.opportunity_id, o.opportunity_name))
                .collect(),
            companies: companies?
                .into_iter()
                .map(|c| (c.company_id, c.company_name))
                .collect(),
            type_labels,
        })
    }

    /// Configured event type labels; empty on failure or when unconfigured
    async fn type_labels(&self) -> HashMap<EventType, String> {
        let Some(source) = &self.system_config else {
            return HashMap::new();
        };
        match source.options(EVENT_TYPE_CATEGORY).await {
            Ok(options) => options
                .into_iter()
                .filter_map(|o| o.value.parse::<EventType>().ok().map(|t| (t, o.label)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "event type labels unavailable, using defaults");
                HashMap::new()
            }
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create_event(&self, draft: &NewEvent, creator: &str) -> Result<SavedEvent> {
        self.repo.create(draft, creator).await
    }

    /// Create from a JSON payload keyed by camelCase field names
    pub async fn create_event_json(&self, payload: &Value, creator: &str) -> Result<SavedEvent> {
        let draft = NewEvent::from_json(payload)?;
        self.create_event(&draft, creator).await
    }

    /// Update by row index as received from a client
    ///
    /// The row index must be an integer greater than 1. A changed event type
    /// moves the record to the other type's table, so callers must use the
    /// returned row index from then on.
    pub async fn update_event(
        &self,
        row_index: &str,
        patch: &EventPatch,
        modifier: &str,
    ) -> Result<SavedEvent> {
        let row_index = parse_row_index(row_index)?;
        self.coordinator.update(row_index, patch, modifier).await
    }

    /// Update from a JSON payload keyed by camelCase field names
    pub async fn update_event_json(
        &self,
        row_index: &str,
        payload: &Value,
        modifier: &str,
    ) -> Result<SavedEvent> {
        let patch = EventPatch::from_json(payload)?;
        self.update_event(row_index, &patch, modifier).await
    }

    pub async fn delete_event(&self, row_index: u32, event_type: EventType) -> Result<()> {
        self.repo.delete(row_index, event_type).await
    }
}

impl std::fmt::Debug for EventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventService")
            .field("repo", &self.repo)
            .field("opportunities", &self.opportunities.is_some())
            .field("companies", &self.companies.is_some())
            .field("system_config", &self.system_config.is_some())
            .finish()
    }
}

fn parse_row_index(raw: &str) -> Result<u32> {
    let row_index = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| StoreError::invalid(format!("row index '{raw}' is not a number")))?;
    if row_index < 2 {
        return Err(StoreError::invalid(format!(
            "row index must be greater than 1, got {row_index}"
        )));
    }
    Ok(row_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_row_index() {
        assert_eq!(parse_row_index(" 7 ").unwrap(), 7);
        for bad in ["", "abc", "2.5", "-3", "1", "0"] {
            assert!(
                matches!(parse_row_index(bad), Err(StoreError::InvalidArgument(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_name_falls_back_to_raw_id() {
        let names = HashMap::from([("OPP1".to_string(), "Line retrofit".to_string())]);
        assert_eq!(display_name(&names, "OPP1").as_deref(), Some("Line retrofit"));
        assert_eq!(display_name(&names, "OPP9").as_deref(), Some("OPP9"));
        assert_eq!(display_name(&names, ""), None);
    }

    #[test]
    fn test_view_serializes_flat() {
        let mut event = EventRecord::new(EventType::Dt);
        event.event_id = "EVT1".into();
        event.company_id = "CMP1".into();
        let view = JoinContext::default().view(event);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["eventId"], "EVT1");
        assert_eq!(json["eventType"], "dt");
        assert_eq!(json["companyName"], "CMP1");
        assert_eq!(json["opportunityName"], Value::Null);
        assert_eq!(json["eventTypeLabel"], "DT");
    }

    #[test]
    fn test_raw_view_has_no_display_names() {
        let mut event = EventRecord::new(EventType::Iot);
        event.opportunity_id = "OPP1".into();
        event.company_id = "CMP1".into();
        let view = EventView::raw(event);

        assert_eq!(view.opportunity_name, None);
        assert_eq!(view.company_name, None);
        assert_eq!(view.event_type_label, "IoT");
    }
}
