//! Event record repository
//!
//! Type-aware create/update/delete of event rows on top of the tabular store.
//! The repository owns identity assignment, timestamps and the revision
//! counter, and invalidates the shared record cache after every mutation.
//!
//! Listing reads all four tables concurrently and caches the combined record
//! set under a single key. Filtering and sorting happen in memory.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventsheet_core::{
    format_timestamp, next_revision, parse_revision, parse_timestamp, resolve_key, CalendarEvent,
    CalendarSink, Clock, EventIdGenerator, EventPatch, EventQuery, EventRecord, EventType, FieldKey,
    NewEvent, Result, SchemaRegistry, StoreConfig, SystemClock, TableSchema,
};
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::backend::TableBackend;
use crate::cache::{CacheInvalidator, RecordCache};
use crate::tabular::TabularStore;

/// Cache key for the combined record set of all tables
pub const EVENTS_CACHE_KEY: &str = "events";

/// Where a write left a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEvent {
    pub event_id: String,
    pub event_type: EventType,
    /// Row in the record's current table
    pub row_index: u32,
    pub revision: u32,
}

/// Event repository over the per-type tables
pub struct EventRepository {
    store: TabularStore,
    registry: Arc<SchemaRegistry>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    ids: EventIdGenerator,
    cache: Arc<RecordCache<Vec<EventRecord>>>,
    invalidators: Vec<Arc<dyn CacheInvalidator>>,
    calendar: Option<Arc<dyn CalendarSink>>,
}

impl EventRepository {
    /// Create a repository using the system clock
    pub fn new(backend: Arc<dyn TableBackend>, config: StoreConfig) -> Result<Self> {
        let registry = Arc::new(SchemaRegistry::new()?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Ok(Self {
            store: TabularStore::new(backend),
            registry,
            ids: EventIdGenerator::new(config.id_prefix.clone(), clock.clone()),
            cache: Arc::new(RecordCache::new(config.cache_ttl)),
            config,
            clock,
            invalidators: Vec::new(),
            calendar: None,
        })
    }

    /// Use a different time source for timestamps and ids
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ids = EventIdGenerator::new(self.config.id_prefix.clone(), clock.clone());
        self.clock = clock;
        self
    }

    /// Emit calendar entries for creates that ask for it
    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarSink>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Register a downstream cache to be invalidated after every mutation
    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidators.push(invalidator);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn table(&self, event_type: EventType) -> &str {
        self.config.table_name(event_type)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a new event row with a fresh id and revision 1
    pub async fn create(&self, draft: &NewEvent, creator: &str) -> Result<SavedEvent> {
        let event_type = draft.event_type;
        let mut record = EventRecord::new(event_type);
        for (key, value) in &draft.values {
            record.set_value(*key, value);
        }

        let now = format_timestamp(self.clock.now());
        record.event_id = self.ids.next_id();
        record.creator = creator.to_string();
        record.created_time = now.clone();
        record.last_modified_time = now;
        record.last_modified_by = creator.to_string();
        record.revision = 1;

        let row_index = self.append_record(&record).await?;
        info!(
            event_id = %record.event_id,
            %event_type,
            row_index,
            "event created"
        );

        if draft.sync_to_calendar {
            self.sync_calendar(&record).await;
        }

        Ok(SavedEvent {
            event_id: record.event_id,
            event_type,
            row_index,
            revision: 1,
        })
    }

    /// Append a fully built record as-is, keeping its id and timestamps
    ///
    /// Used to recreate a record in another table after a type change.
    pub async fn insert(&self, record: &EventRecord) -> Result<u32> {
        let row_index = self.append_record(record).await?;
        debug!(event_id = %record.event_id, row_index, "event inserted");
        Ok(row_index)
    }

    async fn append_record(&self, record: &EventRecord) -> Result<u32> {
        let event_type = record.event_type();
        let row = row_for(self.registry.schema(event_type), record);
        let row_index = self.store.append(self.table(event_type), row).await?;
        self.invalidate().await;
        Ok(row_index)
    }

    /// Update a row in place
    ///
    /// Only keys present in the patch are written; everything else keeps its
    /// stored cell. The id and type cells are never overwritten here.
    pub async fn update(
        &self,
        row_index: u32,
        event_type: EventType,
        patch: &EventPatch,
        modifier: &str,
    ) -> Result<SavedEvent> {
        let schema = self.registry.schema(event_type);
        let table = self.table(event_type);
        let current = self.store.read_row(table, row_index, schema.width()).await?;

        let now = format_timestamp(self.clock.now());
        let revision = next_revision(
            schema
                .cell(&current, FieldKey::Revision)
                .and_then(parse_revision)
                .unwrap_or(1),
        )?;
        let row: Vec<String> = schema
            .columns()
            .iter()
            .zip(current.iter())
            .map(|(column, cell)| match column.key {
                FieldKey::EventId | FieldKey::EventType => cell.clone(),
                FieldKey::LastModifiedTime => now.clone(),
                FieldKey::LastModifiedBy => modifier.to_string(),
                FieldKey::Revision => revision.to_string(),
                key => patch
                    .get(key)
                    .map(str::to_string)
                    .unwrap_or_else(|| cell.clone()),
            })
            .collect();

        let event_id = schema
            .cell(&row, FieldKey::EventId)
            .unwrap_or_default()
            .to_string();
        self.store.write_row(table, row_index, row).await?;
        self.invalidate().await;
        debug!(%event_id, %event_type, row_index, revision, "event updated");

        Ok(SavedEvent {
            event_id,
            event_type,
            row_index,
            revision,
        })
    }

    /// Remove a row; rows below it move up by one
    ///
    /// There is no existence check: deleting past the end succeeds.
    pub async fn delete(&self, row_index: u32, event_type: EventType) -> Result<()> {
        self.store.delete_row(self.table(event_type), row_index).await?;
        self.invalidate().await;
        debug!(%event_type, row_index, "event row deleted");
        Ok(())
    }

    /// Invalidate the record cache and every registered downstream cache
    ///
    /// Failures are logged and never propagate.
    pub async fn invalidate(&self) {
        self.cache.remove(EVENTS_CACHE_KEY);
        for invalidator in &self.invalidators {
            if let Err(e) = invalidator.invalidate(EVENTS_CACHE_KEY).await {
                warn!(error = %e, "cache invalidation failed");
            }
        }
    }

    async fn sync_calendar(&self, record: &EventRecord) {
        let Some(calendar) = &self.calendar else {
            debug!(event_id = %record.event_id, "no calendar configured, skipping sync");
            return;
        };

        let start = parse_timestamp(&record.meeting_time).unwrap_or_else(|| self.clock.now());
        let duration = chrono::Duration::from_std(self.config.calendar_event_duration)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let event = CalendarEvent {
            summary: if record.event_name.is_empty() {
                record.event_id.clone()
            } else {
                record.event_name.clone()
            },
            description: calendar_description(record),
            start,
            end: start.checked_add_signed(duration).unwrap_or(start),
        };

        if let Err(e) = calendar.create_calendar_event(event).await {
            warn!(event_id = %record.event_id, error = %e, "calendar sync failed");
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read one row of a type's table as a record
    pub async fn get_row(&self, event_type: EventType, row_index: u32) -> Result<EventRecord> {
        let schema = self.registry.schema(event_type);
        let row = self
            .store
            .read_row(self.table(event_type), row_index, schema.width())
            .await?;
        Ok(EventRecord::from_row(schema, row_index, &row))
    }

    /// Every record of one type, uncached and unfiltered
    pub async fn scan_type(&self, event_type: EventType) -> Result<Vec<EventRecord>> {
        let schema = self.registry.schema(event_type);
        let rows = self
            .store
            .read_all(self.table(event_type), schema.width())
            .await?;
        Ok(rows
            .iter()
            .map(|(row_index, row)| EventRecord::from_row(schema, *row_index, row))
            .collect())
    }

    /// Every record of every type, read concurrently and bypassing the cache
    pub async fn scan_all(&self) -> Result<Vec<EventRecord>> {
        let per_type = try_join_all(EventType::ALL.iter().map(|t| self.scan_type(*t))).await?;
        Ok(per_type.into_iter().flatten().collect())
    }

    /// Cached record set of all tables, unfiltered and unsorted
    pub async fn list_all(&self) -> Result<Arc<Vec<EventRecord>>> {
        self.cache
            .get_or_populate(EVENTS_CACHE_KEY, || self.scan_all())
            .await
    }

    /// Filtered listing, newest first
    pub async fn list(&self, query: &EventQuery) -> Result<Vec<EventRecord>> {
        let records = self.list_all().await?;
        Ok(query.apply(records.iter(), &self.config.archived_status))
    }

    pub async fn list_by_opportunity(&self, opportunity_id: &str) -> Result<Vec<EventRecord>> {
        self.list(&EventQuery::for_opportunity(opportunity_id)).await
    }

    pub async fn list_by_company(&self, company_id: &str) -> Result<Vec<EventRecord>> {
        self.list(&EventQuery::for_company(company_id)).await
    }

    /// Look up a record by id in the cached record set, archived included
    pub async fn get_by_id(&self, event_id: &str) -> Result<Option<EventRecord>> {
        let records = self.list_all().await?;
        Ok(records.iter().find(|r| r.event_id == event_id).cloned())
    }

    /// Look up a record by id with a fresh read of every table
    pub async fn find_by_id_uncached(&self, event_id: &str) -> Result<Option<EventRecord>> {
        let records = self.scan_all().await?;
        Ok(records.into_iter().find(|r| r.event_id == event_id))
    }

    // ========================================================================
    // Table setup
    // ========================================================================

    /// Write the header row into empty tables and report header drift
    ///
    /// Returns the number of headers written.
    pub async fn ensure_headers(&self) -> Result<usize> {
        let mut written = 0;
        for event_type in EventType::ALL {
            let schema = self.registry.schema(event_type);
            let table = self.table(event_type);
            let header = self.store.read_header(table, schema.width()).await?;

            if header.iter().all(|c| c.trim().is_empty()) {
                self.store.write_header(table, &schema.labels()).await?;
                info!(table, columns = schema.width(), "wrote table header");
                written += 1;
                continue;
            }

            for (column, label) in schema.columns().iter().zip(header.iter()) {
                if resolve_key(label, event_type) != Some(column.key) {
                    warn!(
                        table,
                        expected = column.label,
                        found = %label,
                        "table header does not match schema"
                    );
                }
            }
        }
        Ok(written)
    }
}

impl std::fmt::Debug for EventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRepository")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("invalidators", &self.invalidators.len())
            .field("calendar", &self.calendar.is_some())
            .finish()
    }
}

/// Lay a record out as a row of its schema
pub(crate) fn row_for(schema: &TableSchema, record: &EventRecord) -> Vec<String> {
    schema
        .columns()
        .iter()
        .map(|column| record.value(column.key).unwrap_or_default())
        .collect()
}

fn calendar_description(record: &EventRecord) -> String {
    let mut lines = Vec::new();
    if !record.content.is_empty() {
        lines.push(record.content.clone());
    }
    if !record.location.is_empty() {
        lines.push(format!("Location: {}", record.location));
    }
    let participants: Vec<&str> = record
        .our_participant_list()
        .into_iter()
        .chain(record.client_participant_list())
        .collect();
    if !participants.is_empty() {
        lines.push(format!("Participants: {}", participants.join(", ")));
    }
    lines.join("\n")
}
