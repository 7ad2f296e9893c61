// Event type discriminant
//
// The event type decides which backing table a record lives in and which
// type-specific columns its schema carries.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::StoreError;

/// Discriminant partitioning event records across tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// General meetings and visits (common fields only)
    General,
    /// IoT engagements (device scale, line features, production status, pain points)
    Iot,
    /// Digital transformation engagements (processing type, industry, pain points)
    Dt,
    /// DX engagements (common fields only)
    Dx,
}

impl EventType {
    /// All event types, in table scan order
    pub const ALL: [EventType; 4] = [
        EventType::General,
        EventType::Iot,
        EventType::Dt,
        EventType::Dx,
    ];

    /// Stored value written into the "Event Type" column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Iot => "iot",
            Self::Dt => "dt",
            Self::Dx => "dx",
        }
    }

    /// Built-in display label, used when system config has no entry
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Iot => "IoT",
            Self::Dt => "DT",
            Self::Dx => "DX",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "" => Ok(Self::General),
            "iot" => Ok(Self::Iot),
            "dt" => Ok(Self::Dt),
            "dx" => Ok(Self::Dx),
            other => Err(StoreError::invalid(format!("unknown event type '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("IoT".parse::<EventType>().unwrap(), EventType::Iot);
        assert_eq!(" DT ".parse::<EventType>().unwrap(), EventType::Dt);
        assert_eq!("dx".parse::<EventType>().unwrap(), EventType::Dx);
    }

    #[test]
    fn test_blank_defaults_to_general() {
        assert_eq!("".parse::<EventType>().unwrap(), EventType::General);
    }

    #[test]
    fn test_unknown_type_is_invalid_argument() {
        let err = "webinar".parse::<EventType>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_serde_uses_stored_value() {
        let json = serde_json::to_string(&EventType::Iot).unwrap();
        assert_eq!(json, "\"iot\"");
    }
}
