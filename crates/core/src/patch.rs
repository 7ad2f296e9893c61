// Create and update payloads
//
// Both payloads carry only the fields the caller actually supplied. For
// updates that is what gives partial-update semantics: an absent key keeps
// the stored cell, an empty string clears it.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::event_type::EventType;
use crate::schema::FieldKey;

/// Payload for creating an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub event_type: EventType,
    pub values: BTreeMap<FieldKey, String>,
    /// Emit a calendar entry after the row is written
    pub sync_to_calendar: bool,
}

impl NewEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            values: BTreeMap::new(),
            sync_to_calendar: false,
        }
    }

    /// Set a field value
    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Request a calendar entry for this event
    pub fn with_calendar_sync(mut self) -> Self {
        self.sync_to_calendar = true;
        self
    }

    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Build from a JSON object keyed by camelCase field names
    ///
    /// `eventType` defaults to general; `syncToCalendar` is read as a flag.
    pub fn from_json(payload: &Value) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| StoreError::invalid("event payload must be a JSON object"))?;
        let event_type = match object.get("eventType").and_then(cell_text) {
            Some(raw) => raw.parse()?,
            None => EventType::General,
        };
        let sync_to_calendar = object
            .get("syncToCalendar")
            .map(|v| v.as_bool().unwrap_or_else(|| cell_text(v).as_deref() == Some("true")))
            .unwrap_or(false);
        Ok(Self {
            event_type,
            values: collect_values(object),
            sync_to_calendar,
        })
    }
}

/// Payload for updating an event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    /// Identity of the record being updated, when the caller knows it
    pub event_id: Option<String>,
    /// Requested event type; a change triggers a move between tables
    pub event_type: Option<EventType>,
    pub values: BTreeMap<FieldKey, String>,
}

impl EventPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            ..Default::default()
        }
    }

    /// Set a field value
    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Request a new event type
    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.event_type.is_none()
    }

    /// Build from a JSON object keyed by camelCase field names
    ///
    /// Null values count as absent. `rowIndex` and unknown keys are ignored.
    pub fn from_json(payload: &Value) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| StoreError::invalid("event payload must be a JSON object"))?;
        let event_type = object
            .get("eventType")
            .and_then(cell_text)
            .map(|raw| raw.parse::<EventType>())
            .transpose()?;
        let event_id = object
            .get("eventId")
            .and_then(cell_text)
            .filter(|id| !id.trim().is_empty());
        Ok(Self {
            event_id,
            event_type,
            values: collect_values(object),
        })
    }
}

fn collect_values(object: &serde_json::Map<String, Value>) -> BTreeMap<FieldKey, String> {
    let mut values = BTreeMap::new();
    for (name, value) in object {
        let Ok(key) = name.parse::<FieldKey>() else {
            if !matches!(name.as_str(), "rowIndex" | "syncToCalendar") {
                tracing::debug!(field = %name, "ignoring unknown event field");
            }
            continue;
        };
        if matches!(key, FieldKey::EventId | FieldKey::EventType) {
            continue;
        }
        if let Some(text) = cell_text(value) {
            values.insert(key, text);
        }
    }
    values
}

/// Render a JSON value as cell text; None for null
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(cell_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}
