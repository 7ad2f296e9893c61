// Store configuration
//
// Configuration for table names, id format and read behaviour, loaded from
// environment variables or built directly.

use std::env;
use std::time::Duration;

use crate::event_type::EventType;

/// Backing table name for each event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub general: String,
    pub iot: String,
    pub dt: String,
    pub dx: String,
}

impl TableNames {
    pub fn for_type(&self, event_type: EventType) -> &str {
        match event_type {
            EventType::General => &self.general,
            EventType::Iot => &self.iot,
            EventType::Dt => &self.dt,
            EventType::Dx => &self.dx,
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            general: "Events".to_string(),
            iot: "IoT Events".to_string(),
            dt: "DT Events".to_string(),
            dx: "DX Events".to_string(),
        }
    }
}

/// Configuration for the event record store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub tables: TableNames,

    /// Literal prefix of generated event ids
    pub id_prefix: String,

    /// Status value that hides a record from default listings
    pub archived_status: String,

    /// How long a populated cache entry is served; None keeps it until invalidated
    pub cache_ttl: Option<Duration>,

    /// Length of calendar entries emitted on create
    pub calendar_event_duration: Duration,
}

impl StoreConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `EVENTSHEET_TABLE_GENERAL`, `EVENTSHEET_TABLE_IOT`, `EVENTSHEET_TABLE_DT`,
    ///   `EVENTSHEET_TABLE_DX`: table names
    /// - `EVENTSHEET_ID_PREFIX`: event id prefix (default: EVT)
    /// - `EVENTSHEET_ARCHIVED_STATUS`: archived sentinel (default: Archived)
    /// - `EVENTSHEET_CACHE_TTL_SECS`: cache TTL, 0 disables expiry (default: 300)
    /// - `EVENTSHEET_CALENDAR_DURATION_MINUTES`: calendar entry length (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let tables = TableNames {
            general: env::var("EVENTSHEET_TABLE_GENERAL").unwrap_or(defaults.tables.general),
            iot: env::var("EVENTSHEET_TABLE_IOT").unwrap_or(defaults.tables.iot),
            dt: env::var("EVENTSHEET_TABLE_DT").unwrap_or(defaults.tables.dt),
            dx: env::var("EVENTSHEET_TABLE_DX").unwrap_or(defaults.tables.dx),
        };

        let cache_ttl = match env::var("EVENTSHEET_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.cache_ttl,
        };

        let calendar_event_duration = env::var("EVENTSHEET_CALENDAR_DURATION_MINUTES")
            .ok()
            .and_then(|v| parse_minutes(&v))
            .unwrap_or(defaults.calendar_event_duration);

        Self {
            tables,
            id_prefix: env::var("EVENTSHEET_ID_PREFIX").unwrap_or(defaults.id_prefix),
            archived_status: env::var("EVENTSHEET_ARCHIVED_STATUS")
                .unwrap_or(defaults.archived_status),
            cache_ttl,
            calendar_event_duration,
        }
    }

    pub fn table_name(&self, event_type: EventType) -> &str {
        self.tables.for_type(event_type)
    }

    pub fn with_tables(mut self, tables: TableNames) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    pub fn with_archived_status(mut self, status: impl Into<String>) -> Self {
        self.archived_status = status.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_calendar_event_duration(mut self, duration: Duration) -> Self {
        self.calendar_event_duration = duration;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tables: TableNames::default(),
            id_prefix: "EVT".to_string(),
            archived_status: "Archived".to_string(),
            cache_ttl: Some(Duration::from_secs(300)),
            calendar_event_duration: Duration::from_secs(60 * 60),
        }
    }
}

/// Whole minutes as a duration; absurdly large values saturate
fn parse_minutes(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .map(|minutes| Duration::from_secs(minutes.saturating_mul(60)))
}
