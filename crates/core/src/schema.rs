// Schema registry
//
// Each event type's table has a fixed column order: the common columns first,
// then the type-specific columns. Header labels are resolved to canonical
// FieldKeys once, when the registry is built, so reading and writing rows never
// goes through string lookups.
//
// Labels shared by two types with different meanings ("Pain Points") resolve
// through the (label, type) override table before the generic label map.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{Result, StoreError};
use crate::event_type::EventType;

/// Canonical field key on an event record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    EventId,
    EventName,
    EventType,
    OpportunityId,
    CompanyId,
    MeetingTime,
    Location,
    OurParticipants,
    ClientParticipants,
    Content,
    ClientQuestions,
    ClientIntelligence,
    Notes,
    Status,
    Creator,
    CreatedTime,
    LastModifiedTime,
    LastModifiedBy,
    Revision,
    IotDeviceScale,
    IotLineFeatures,
    IotProductionStatus,
    IotPainPoints,
    DtProcessingType,
    DtIndustry,
    DtPainPoints,
}

impl FieldKey {
    pub const ALL: [FieldKey; 26] = [
        FieldKey::EventId,
        FieldKey::EventName,
        FieldKey::EventType,
        FieldKey::OpportunityId,
        FieldKey::CompanyId,
        FieldKey::MeetingTime,
        FieldKey::Location,
        FieldKey::OurParticipants,
        FieldKey::ClientParticipants,
        FieldKey::Content,
        FieldKey::ClientQuestions,
        FieldKey::ClientIntelligence,
        FieldKey::Notes,
        FieldKey::Status,
        FieldKey::Creator,
        FieldKey::CreatedTime,
        FieldKey::LastModifiedTime,
        FieldKey::LastModifiedBy,
        FieldKey::Revision,
        FieldKey::IotDeviceScale,
        FieldKey::IotLineFeatures,
        FieldKey::IotProductionStatus,
        FieldKey::IotPainPoints,
        FieldKey::DtProcessingType,
        FieldKey::DtIndustry,
        FieldKey::DtPainPoints,
    ];

    /// camelCase key used in JSON payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventId => "eventId",
            Self::EventName => "eventName",
            Self::EventType => "eventType",
            Self::OpportunityId => "opportunityId",
            Self::CompanyId => "companyId",
            Self::MeetingTime => "meetingTime",
            Self::Location => "location",
            Self::OurParticipants => "ourParticipants",
            Self::ClientParticipants => "clientParticipants",
            Self::Content => "content",
            Self::ClientQuestions => "clientQuestions",
            Self::ClientIntelligence => "clientIntelligence",
            Self::Notes => "notes",
            Self::Status => "status",
            Self::Creator => "creator",
            Self::CreatedTime => "createdTime",
            Self::LastModifiedTime => "lastModifiedTime",
            Self::LastModifiedBy => "lastModifiedBy",
            Self::Revision => "revision",
            Self::IotDeviceScale => "iotDeviceScale",
            Self::IotLineFeatures => "iotLineFeatures",
            Self::IotProductionStatus => "iotProductionStatus",
            Self::IotPainPoints => "iotPainPoints",
            Self::DtProcessingType => "dtProcessingType",
            Self::DtIndustry => "dtIndustry",
            Self::DtPainPoints => "dtPainPoints",
        }
    }

    /// The event type owning this key, or None for common keys
    pub fn owner(&self) -> Option<EventType> {
        match self {
            Self::IotDeviceScale
            | Self::IotLineFeatures
            | Self::IotProductionStatus
            | Self::IotPainPoints => Some(EventType::Iot),
            Self::DtProcessingType | Self::DtIndustry | Self::DtPainPoints => Some(EventType::Dt),
            _ => None,
        }
    }

    /// Keys managed by the repository itself; callers cannot set them in place
    pub fn is_system_managed(&self) -> bool {
        matches!(
            self,
            Self::EventId
                | Self::EventType
                | Self::LastModifiedTime
                | Self::LastModifiedBy
                | Self::Revision
        )
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FieldKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| StoreError::invalid(format!("unknown field key '{s}'")))
    }
}

// ============================================================================
// Label tables
// ============================================================================

const COMMON_LABELS: [&str; 19] = [
    "Event ID",
    "Event Name",
    "Event Type",
    "Opportunity ID",
    "Company ID",
    "Meeting Time",
    "Location",
    "Our Participants",
    "Client Participants",
    "Content",
    "Client Questions",
    "Client Intelligence",
    "Notes",
    "Status",
    "Creator",
    "Created Time",
    "Last Modified Time",
    "Last Modified By",
    "Revision",
];

const IOT_LABELS: [&str; 4] = [
    "Device Scale",
    "Line Features",
    "Production Status",
    "Pain Points",
];

const DT_LABELS: [&str; 3] = ["Processing Type", "Industry", "Pain Points"];

/// Generic label → key map, consulted after the override table
const LABEL_KEYS: [(&str, FieldKey); 28] = [
    ("Event ID", FieldKey::EventId),
    ("Event Name", FieldKey::EventName),
    ("Event Type", FieldKey::EventType),
    ("Opportunity ID", FieldKey::OpportunityId),
    ("Company ID", FieldKey::CompanyId),
    ("Meeting Time", FieldKey::MeetingTime),
    ("Location", FieldKey::Location),
    ("Our Participants", FieldKey::OurParticipants),
    ("Client Participants", FieldKey::ClientParticipants),
    ("Content", FieldKey::Content),
    ("Client Questions", FieldKey::ClientQuestions),
    ("Client Intelligence", FieldKey::ClientIntelligence),
    ("Notes", FieldKey::Notes),
    ("Status", FieldKey::Status),
    ("Creator", FieldKey::Creator),
    ("Created Time", FieldKey::CreatedTime),
    ("Last Modified Time", FieldKey::LastModifiedTime),
    ("Last Modified By", FieldKey::LastModifiedBy),
    ("Revision", FieldKey::Revision),
    ("Device Scale", FieldKey::IotDeviceScale),
    ("Line Features", FieldKey::IotLineFeatures),
    ("Production Status", FieldKey::IotProductionStatus),
    ("Pain Points", FieldKey::IotPainPoints),
    ("Processing Type", FieldKey::DtProcessingType),
    ("Industry", FieldKey::DtIndustry),
    // Legacy header aliases
    ("Edit Count", FieldKey::Revision),
    ("Modified Time", FieldKey::LastModifiedTime),
    ("Event Title", FieldKey::EventName),
];

/// (label, type) overrides for labels shared across types
const LABEL_OVERRIDES: [(&str, EventType, FieldKey); 1] =
    [("Pain Points", EventType::Dt, FieldKey::DtPainPoints)];

/// Resolve a header label to the field key for the given event type
///
/// The override table wins; otherwise the generic map applies. Returns None
/// for labels this schema does not know.
pub fn resolve_key(label: &str, event_type: EventType) -> Option<FieldKey> {
    let label = label.trim();
    LABEL_OVERRIDES
        .iter()
        .find(|(l, t, _)| *l == label && *t == event_type)
        .map(|(_, _, key)| *key)
        .or_else(|| {
            LABEL_KEYS
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, key)| *key)
        })
}

/// Ordered column labels of a type's table
pub fn labels_for(event_type: EventType) -> Vec<&'static str> {
    let extra: &[&str] = match event_type {
        EventType::Iot => &IOT_LABELS,
        EventType::Dt => &DT_LABELS,
        EventType::General | EventType::Dx => &[],
    };
    COMMON_LABELS.iter().chain(extra.iter()).copied().collect()
}

/// Spreadsheet column letter for a 1-based column number (1 → A, 27 → AA)
///
/// Column 0 has no letter and yields an empty string.
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

// ============================================================================
// Resolved schemas
// ============================================================================

/// A header label paired with the key it resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub label: &'static str,
    pub key: FieldKey,
}

/// Resolved column layout of one event type's table
#[derive(Debug, Clone)]
pub struct TableSchema {
    event_type: EventType,
    columns: Vec<Column>,
    positions: HashMap<FieldKey, usize>,
}

impl TableSchema {
    fn build(event_type: EventType) -> Result<Self> {
        let mut columns = Vec::new();
        let mut positions = HashMap::new();
        for label in labels_for(event_type) {
            let key = resolve_key(label, event_type).ok_or_else(|| {
                StoreError::config(format!("label '{label}' has no key for {event_type}"))
            })?;
            if positions.insert(key, columns.len()).is_some() {
                return Err(StoreError::config(format!(
                    "key '{key}' mapped twice in {event_type} schema"
                )));
            }
            columns.push(Column { label, key });
        }
        Ok(Self {
            event_type,
            columns,
            positions,
        })
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns, i.e. the row width in the backing table
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.label).collect()
    }

    /// Letter of the rightmost column, e.g. "W" for a 23-column table
    pub fn last_column_letter(&self) -> String {
        column_letter(self.width())
    }

    /// Zero-based column position of a key
    pub fn position_of(&self, key: FieldKey) -> Option<usize> {
        self.positions.get(&key).copied()
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.positions.contains_key(&key)
    }

    /// Cell value for `key` in a row laid out by this schema
    pub fn cell<'a>(&self, row: &'a [String], key: FieldKey) -> Option<&'a str> {
        self.position_of(key)
            .and_then(|pos| row.get(pos))
            .map(String::as_str)
    }
}

/// Schemas for every event type, resolved at startup
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<EventType, TableSchema>,
}

impl SchemaRegistry {
    /// Build and validate all table schemas
    pub fn new() -> Result<Self> {
        let mut schemas = HashMap::new();
        for event_type in EventType::ALL {
            schemas.insert(event_type, TableSchema::build(event_type)?);
        }
        Ok(Self { schemas })
    }

    pub fn schema(&self, event_type: EventType) -> &TableSchema {
        // Every variant is inserted in new()
        &self.schemas[&event_type]
    }

    /// Canonical header label for a key
    pub fn label_for(&self, key: FieldKey) -> Option<&'static str> {
        let event_type = key.owner().unwrap_or(EventType::General);
        self.schema(event_type)
            .columns()
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_columns_come_first() {
        let registry = SchemaRegistry::new().unwrap();
        let iot = registry.schema(EventType::Iot);
        assert_eq!(iot.width(), 23);
        assert_eq!(iot.columns()[0].key, FieldKey::EventId);
        assert_eq!(iot.columns()[18].key, FieldKey::Revision);
        assert_eq!(iot.columns()[19].key, FieldKey::IotDeviceScale);
    }

    #[test]
    fn test_widths_per_type() {
        let registry = SchemaRegistry::new().unwrap();
        assert_eq!(registry.schema(EventType::General).width(), 19);
        assert_eq!(registry.schema(EventType::Dx).width(), 19);
        assert_eq!(registry.schema(EventType::Iot).width(), 23);
        assert_eq!(registry.schema(EventType::Dt).width(), 22);
    }

    #[test]
    fn test_shared_label_resolves_by_type() {
        assert_eq!(
            resolve_key("Pain Points", EventType::Iot),
            Some(FieldKey::IotPainPoints)
        );
        assert_eq!(
            resolve_key("Pain Points", EventType::Dt),
            Some(FieldKey::DtPainPoints)
        );
    }

    #[test]
    fn test_override_falls_back_to_generic_map() {
        // No override for DX, so the generic mapping applies
        assert_eq!(
            resolve_key("Pain Points", EventType::Dx),
            Some(FieldKey::IotPainPoints)
        );
        assert_eq!(
            resolve_key(" Edit Count ", EventType::General),
            Some(FieldKey::Revision)
        );
        assert_eq!(resolve_key("Budget", EventType::General), None);
    }

    #[test]
    fn test_dt_schema_has_no_device_scale() {
        let registry = SchemaRegistry::new().unwrap();
        let dt = registry.schema(EventType::Dt);
        assert!(!dt.contains(FieldKey::IotDeviceScale));
        assert!(dt.contains(FieldKey::DtPainPoints));
        assert!(!dt.contains(FieldKey::IotPainPoints));
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(19), "S");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(702), "ZZ");
        assert_eq!(column_letter(703), "AAA");
        assert_eq!(column_letter(0), "");

        let registry = SchemaRegistry::new().unwrap();
        assert_eq!(registry.schema(EventType::Iot).last_column_letter(), "W");
        assert_eq!(registry.schema(EventType::Dt).last_column_letter(), "V");
    }

    #[test]
    fn test_label_for_type_specific_key() {
        let registry = SchemaRegistry::new().unwrap();
        assert_eq!(registry.label_for(FieldKey::DtPainPoints), Some("Pain Points"));
        assert_eq!(registry.label_for(FieldKey::Revision), Some("Revision"));
    }

    #[test]
    fn test_field_key_round_trips_through_str() {
        for key in FieldKey::ALL {
            assert_eq!(key.as_str().parse::<FieldKey>().unwrap(), key);
        }
        assert!("rowIndex".parse::<FieldKey>().is_err());
    }
}
