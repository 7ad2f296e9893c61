// Event Record Core
//
// This crate provides the storage-agnostic model of the event record store:
// typed records, per-type table schemas, create/update payloads, listing
// filters, errors and configuration.
//
// Key design decisions:
// - Header labels are resolved to FieldKeys once, in SchemaRegistry::new
// - The type-specific part of a record is an enum, so a record can only carry
//   the fields of its current event type
// - Collaborators (opportunities, companies, system config, calendar) are traits
//   with in-memory implementations for examples and tests
// - Timestamps and ids come from an injected Clock

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod event_type;
pub mod id;
pub mod patch;
pub mod query;
pub mod schema;
pub mod traits;

// Tracing setup for binaries and examples
pub mod telemetry;

// In-memory collaborators for examples and testing
pub mod memory;

// Re-exports for convenience
pub use clock::{format_timestamp, parse_timestamp, Clock, ManualClock, SystemClock};
pub use config::{StoreConfig, TableNames};
pub use error::{MigrationPhase, Result, StoreError};
pub use event::{next_revision, parse_revision, DtDetails, EventDetails, EventRecord, IotDetails};
pub use event_type::EventType;
pub use id::EventIdGenerator;
pub use patch::{EventPatch, NewEvent};
pub use query::{sort_newest_first, EventQuery};
pub use schema::{column_letter, resolve_key, Column, FieldKey, SchemaRegistry, TableSchema};
pub use traits::{
    CalendarEvent, CalendarSink, Company, CompanySource, ConfigOption, Opportunity,
    OpportunitySource, SystemConfigSource, EVENT_TYPE_CATEGORY,
};
