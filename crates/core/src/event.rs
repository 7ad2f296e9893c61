// Event record domain type
//
// EventRecord is the typed view of one table row. The type-specific part lives
// in EventDetails, so a record can only ever carry the fields of its current
// event type.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::parse_timestamp;
use crate::error::{Result, StoreError};
use crate::event_type::EventType;
use crate::schema::{FieldKey, TableSchema};

/// IoT-specific fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IotDetails {
    #[serde(rename = "iotDeviceScale")]
    pub device_scale: String,
    #[serde(rename = "iotLineFeatures")]
    pub line_features: String,
    #[serde(rename = "iotProductionStatus")]
    pub production_status: String,
    #[serde(rename = "iotPainPoints")]
    pub pain_points: String,
}

/// DT-specific fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DtDetails {
    #[serde(rename = "dtProcessingType")]
    pub processing_type: String,
    #[serde(rename = "dtIndustry")]
    pub industry: String,
    #[serde(rename = "dtPainPoints")]
    pub pain_points: String,
}

/// Type-specific part of a record; the variant is the event type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "eventType", rename_all = "lowercase")]
pub enum EventDetails {
    General,
    Iot(IotDetails),
    Dt(DtDetails),
    Dx,
}

impl EventDetails {
    pub fn empty(event_type: EventType) -> Self {
        match event_type {
            EventType::General => Self::General,
            EventType::Iot => Self::Iot(IotDetails::default()),
            EventType::Dt => Self::Dt(DtDetails::default()),
            EventType::Dx => Self::Dx,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Self::General => EventType::General,
            Self::Iot(_) => EventType::Iot,
            Self::Dt(_) => EventType::Dt,
            Self::Dx => EventType::Dx,
        }
    }
}

/// One event as stored in its type's table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub event_id: String,
    /// 1-based row in the current type's table; changes when the type changes
    pub row_index: u32,
    pub event_name: String,
    pub opportunity_id: String,
    pub company_id: String,
    pub meeting_time: String,
    pub location: String,
    pub our_participants: String,
    pub client_participants: String,
    pub content: String,
    pub client_questions: String,
    pub client_intelligence: String,
    pub notes: String,
    pub status: String,
    pub creator: String,
    pub created_time: String,
    pub last_modified_time: String,
    pub last_modified_by: String,
    pub revision: u32,
    #[serde(flatten)]
    pub details: EventDetails,
}

impl EventRecord {
    /// Blank record of the given type
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_id: String::new(),
            row_index: 0,
            event_name: String::new(),
            opportunity_id: String::new(),
            company_id: String::new(),
            meeting_time: String::new(),
            location: String::new(),
            our_participants: String::new(),
            client_participants: String::new(),
            content: String::new(),
            client_questions: String::new(),
            client_intelligence: String::new(),
            notes: String::new(),
            status: String::new(),
            creator: String::new(),
            created_time: String::new(),
            last_modified_time: String::new(),
            last_modified_by: String::new(),
            revision: 1,
            details: EventDetails::empty(event_type),
        }
    }

    /// Convert a padded table row into a record
    ///
    /// The event type comes from the table, not from the row's own
    /// "Event Type" cell, which may be blank on legacy rows.
    pub fn from_row(schema: &TableSchema, row_index: u32, row: &[String]) -> Self {
        let mut record = Self::new(schema.event_type());
        record.row_index = row_index;
        for (column, cell) in schema.columns().iter().zip(row.iter()) {
            record.set_value(column.key, cell);
        }
        record
    }

    pub fn event_type(&self) -> EventType {
        self.details.event_type()
    }

    /// Value of a field, or None when the key is not part of this record's schema
    pub fn value(&self, key: FieldKey) -> Option<String> {
        let common = match key {
            FieldKey::EventId => &self.event_id,
            FieldKey::EventName => &self.event_name,
            FieldKey::EventType => return Some(self.event_type().as_str().to_string()),
            FieldKey::OpportunityId => &self.opportunity_id,
            FieldKey::CompanyId => &self.company_id,
            FieldKey::MeetingTime => &self.meeting_time,
            FieldKey::Location => &self.location,
            FieldKey::OurParticipants => &self.our_participants,
            FieldKey::ClientParticipants => &self.client_participants,
            FieldKey::Content => &self.content,
            FieldKey::ClientQuestions => &self.client_questions,
            FieldKey::ClientIntelligence => &self.client_intelligence,
            FieldKey::Notes => &self.notes,
            FieldKey::Status => &self.status,
            FieldKey::Creator => &self.creator,
            FieldKey::CreatedTime => &self.created_time,
            FieldKey::LastModifiedTime => &self.last_modified_time,
            FieldKey::LastModifiedBy => &self.last_modified_by,
            FieldKey::Revision => return Some(self.revision.to_string()),
            _ => return self.detail_value(key),
        };
        Some(common.clone())
    }

    fn detail_value(&self, key: FieldKey) -> Option<String> {
        let value = match (&self.details, key) {
            (EventDetails::Iot(iot), FieldKey::IotDeviceScale) => &iot.device_scale,
            (EventDetails::Iot(iot), FieldKey::IotLineFeatures) => &iot.line_features,
            (EventDetails::Iot(iot), FieldKey::IotProductionStatus) => &iot.production_status,
            (EventDetails::Iot(iot), FieldKey::IotPainPoints) => &iot.pain_points,
            (EventDetails::Dt(dt), FieldKey::DtProcessingType) => &dt.processing_type,
            (EventDetails::Dt(dt), FieldKey::DtIndustry) => &dt.industry,
            (EventDetails::Dt(dt), FieldKey::DtPainPoints) => &dt.pain_points,
            _ => return None,
        };
        Some(value.clone())
    }

    /// Set a field from its cell value; keys outside this record's schema are ignored
    pub fn set_value(&mut self, key: FieldKey, cell: &str) {
        let value = cell.to_string();
        match key {
            FieldKey::EventId => self.event_id = value,
            FieldKey::EventName => self.event_name = value,
            FieldKey::EventType => {}
            FieldKey::OpportunityId => self.opportunity_id = value,
            FieldKey::CompanyId => self.company_id = value,
            FieldKey::MeetingTime => self.meeting_time = value,
            FieldKey::Location => self.location = value,
            FieldKey::OurParticipants => self.our_participants = value,
            FieldKey::ClientParticipants => self.client_participants = value,
            FieldKey::Content => self.content = value,
            FieldKey::ClientQuestions => self.client_questions = value,
            FieldKey::ClientIntelligence => self.client_intelligence = value,
            FieldKey::Notes => self.notes = value,
            FieldKey::Status => self.status = value,
            FieldKey::Creator => self.creator = value,
            FieldKey::CreatedTime => self.created_time = value,
            FieldKey::LastModifiedTime => self.last_modified_time = value,
            FieldKey::LastModifiedBy => self.last_modified_by = value,
            FieldKey::Revision => self.revision = parse_revision(cell).unwrap_or(1),
            _ => match (&mut self.details, key) {
                (EventDetails::Iot(iot), FieldKey::IotDeviceScale) => iot.device_scale = value,
                (EventDetails::Iot(iot), FieldKey::IotLineFeatures) => iot.line_features = value,
                (EventDetails::Iot(iot), FieldKey::IotProductionStatus) => {
                    iot.production_status = value
                }
                (EventDetails::Iot(iot), FieldKey::IotPainPoints) => iot.pain_points = value,
                (EventDetails::Dt(dt), FieldKey::DtProcessingType) => dt.processing_type = value,
                (EventDetails::Dt(dt), FieldKey::DtIndustry) => dt.industry = value,
                (EventDetails::Dt(dt), FieldKey::DtPainPoints) => dt.pain_points = value,
                _ => {}
            },
        }
    }

    /// Every non-empty field value of this record, keyed by field
    pub fn values(&self) -> BTreeMap<FieldKey, String> {
        FieldKey::ALL
            .iter()
            .filter_map(|key| self.value(*key).map(|v| (*key, v)))
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }

    /// Whether the status cell equals the archived sentinel
    pub fn is_archived(&self, sentinel: &str) -> bool {
        !sentinel.is_empty() && self.status.trim().eq_ignore_ascii_case(sentinel.trim())
    }

    /// Last-modified time, falling back to created time
    pub fn sort_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.last_modified_time).or_else(|| parse_timestamp(&self.created_time))
    }

    pub fn our_participant_list(&self) -> Vec<&str> {
        split_participants(&self.our_participants)
    }

    pub fn client_participant_list(&self) -> Vec<&str> {
        split_participants(&self.client_participants)
    }
}

/// Parse a revision cell; spreadsheets may hand back "3" or "3.0"
pub fn parse_revision(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<u32>() {
        return Some(n);
    }
    cell.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
}

/// The revision that follows `current`; fails once the counter is exhausted
pub fn next_revision(current: u32) -> Result<u32> {
    current
        .checked_add(1)
        .ok_or_else(|| StoreError::store(format!("revision {current} cannot be incremented")))
}

fn split_participants(cell: &str) -> Vec<&str> {
    cell.split([',', '、'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_from_row_maps_type_specific_columns() {
        let registry = SchemaRegistry::new().unwrap();
        let schema = registry.schema(EventType::Dt);
        let mut cells = vec![String::new(); schema.width()];
        cells[0] = "EVT1".into();
        cells[1] = "Plant review".into();
        cells[18] = "4".into();
        cells[19] = "Batch".into();
        cells[21] = "Manual reporting".into();

        let record = EventRecord::from_row(schema, 5, &cells);

        assert_eq!(record.event_id, "EVT1");
        assert_eq!(record.row_index, 5);
        assert_eq!(record.revision, 4);
        assert_eq!(record.event_type(), EventType::Dt);
        let EventDetails::Dt(dt) = &record.details else {
            panic!("expected DT details");
        };
        assert_eq!(dt.processing_type, "Batch");
        assert_eq!(dt.pain_points, "Manual reporting");
    }

    #[test]
    fn test_short_row_leaves_missing_fields_blank() {
        let registry = SchemaRegistry::new().unwrap();
        let schema = registry.schema(EventType::General);
        let record = EventRecord::from_row(schema, 2, &row(&["EVT9", "Kickoff"]));
        assert_eq!(record.event_name, "Kickoff");
        assert_eq!(record.notes, "");
        assert_eq!(record.revision, 1);
    }

    #[test]
    fn test_value_is_none_for_foreign_type_keys() {
        let record = EventRecord::new(EventType::Iot);
        assert_eq!(record.value(FieldKey::IotPainPoints), Some(String::new()));
        assert_eq!(record.value(FieldKey::DtIndustry), None);
        assert_eq!(record.value(FieldKey::EventType), Some("iot".into()));
    }

    #[test]
    fn test_archived_match_ignores_case_and_whitespace() {
        let mut record = EventRecord::new(EventType::General);
        record.status = " archived ".into();
        assert!(record.is_archived("Archived"));
        record.status = "Open".into();
        assert!(!record.is_archived("Archived"));
    }

    #[test]
    fn test_sort_time_falls_back_to_created() {
        let mut record = EventRecord::new(EventType::General);
        record.created_time = "2026-01-02T00:00:00.000Z".into();
        assert_eq!(record.sort_time(), parse_timestamp("2026-01-02T00:00:00.000Z"));
        record.last_modified_time = "2026-02-02T00:00:00.000Z".into();
        assert_eq!(record.sort_time(), parse_timestamp("2026-02-02T00:00:00.000Z"));
    }

    #[test]
    fn test_parse_revision_accepts_float_cells() {
        assert_eq!(parse_revision("3"), Some(3));
        assert_eq!(parse_revision("3.0"), Some(3));
        assert_eq!(parse_revision("3.5"), None);
        assert_eq!(parse_revision("n/a"), None);
    }

    #[test]
    fn test_next_revision_stops_at_max() {
        assert_eq!(next_revision(1).unwrap(), 2);
        assert!(matches!(
            next_revision(u32::MAX),
            Err(StoreError::StoreFailure(_))
        ));
    }

    #[test]
    fn test_participants_split_on_both_separators() {
        let mut record = EventRecord::new(EventType::General);
        record.our_participants = "Ana, Bo、Chen ,".into();
        assert_eq!(record.our_participant_list(), vec!["Ana", "Bo", "Chen"]);
    }

    #[test]
    fn test_serializes_flat_with_event_type_tag() {
        let mut record = EventRecord::new(EventType::Iot);
        record.event_id = "EVT2".into();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["eventType"], "iot");
        assert_eq!(json["eventId"], "EVT2");
        assert_eq!(json["iotPainPoints"], "");
    }
}
