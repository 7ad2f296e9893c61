//! Migration coordinator
//!
//! Entry point for updates. Resolves which stored record an update refers to,
//! then either updates it in place or, when the requested event type differs
//! from the stored one, moves it to the other type's table.
//!
//! A move is delete-then-create with no transaction around it. If the delete
//! succeeds and the create fails, the record exists in neither table; the full
//! row is logged at error level and the caller gets a data-loss
//! MigrationFailure. There is no retry.

use std::sync::Arc;

use eventsheet_core::{
    format_timestamp, next_revision, EventPatch, EventRecord, EventType, FieldKey,
    MigrationPhase, Result, StoreError,
};
use tracing::{debug, error, info, warn};

use crate::repository::{row_for, EventRepository, SavedEvent};
use crate::tabular::FIRST_DATA_ROW;

/// How a record was matched to an update request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    /// Matched by physical row only
    RowIndex,
    /// Matched by exact event id
    EventId,
}

/// The stored record an update refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub record: EventRecord,
    pub confidence: Confidence,
}

/// Routes updates to in-place writes or cross-table moves
#[derive(Debug, Clone)]
pub struct MigrationCoordinator {
    repo: Arc<EventRepository>,
}

impl MigrationCoordinator {
    pub fn new(repo: Arc<EventRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<EventRepository> {
        &self.repo
    }

    /// Find the stored record an update refers to
    ///
    /// An exact id match from a fresh read of every table wins. Without one,
    /// the row index is tried in each table and must match in exactly one;
    /// a row index present in several tables is rejected as ambiguous.
    pub async fn resolve(&self, row_index: u32, patch: &EventPatch) -> Result<Resolution> {
        if let Some(event_id) = &patch.event_id {
            if let Some(record) = self.repo.find_by_id_uncached(event_id).await? {
                if record.row_index != row_index {
                    debug!(
                        %event_id,
                        requested_row = row_index,
                        actual_row = record.row_index,
                        "event moved since it was read"
                    );
                }
                return Ok(Resolution {
                    record,
                    confidence: Confidence::EventId,
                });
            }
        }

        let mut candidates = Vec::new();
        for event_type in EventType::ALL {
            match self.repo.get_row(event_type, row_index).await {
                Ok(record) => candidates.push(record),
                Err(StoreError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        let record = match candidates.len() {
            0 => {
                return Err(match &patch.event_id {
                    Some(event_id) => StoreError::EventNotFound(event_id.clone()),
                    None => StoreError::not_found(
                        self.repo
                            .config()
                            .table_name(patch.event_type.unwrap_or(EventType::General)),
                        row_index,
                    ),
                });
            }
            1 => candidates.remove(0),
            n => {
                // The patch's type is the target on a type change, not the stored type
                let tables: Vec<&str> = candidates
                    .iter()
                    .map(|r| self.repo.config().table_name(r.event_type()))
                    .collect();
                warn!(
                    event_id = patch.event_id.as_deref().unwrap_or(""),
                    row_index,
                    candidates = n,
                    tables = ?tables,
                    "row index matches rows in several tables"
                );
                return Err(StoreError::invalid(format!(
                    "row {row_index} exists in {} tables; an event id is required",
                    tables.join(", ")
                )));
            }
        };
        warn!(
            event_id = patch.event_id.as_deref().unwrap_or(""),
            resolved_id = %record.event_id,
            event_type = %record.event_type(),
            row_index,
            "resolved event by row index"
        );
        Ok(Resolution {
            record,
            confidence: Confidence::RowIndex,
        })
    }

    /// Apply an update, moving the record when its event type changes
    pub async fn update(
        &self,
        row_index: u32,
        patch: &EventPatch,
        modifier: &str,
    ) -> Result<SavedEvent> {
        if row_index < FIRST_DATA_ROW {
            return Err(StoreError::invalid(format!(
                "row index must be greater than 1, got {row_index}"
            )));
        }

        let Resolution { record, .. } = self.resolve(row_index, patch).await?;
        let current_type = record.event_type();
        let target_type = patch.event_type.unwrap_or(current_type);

        if target_type == current_type {
            return self
                .repo
                .update(record.row_index, current_type, patch, modifier)
                .await;
        }
        self.move_record(record, target_type, patch, modifier).await
    }

    /// Delete the record from its table and recreate it in the target table
    async fn move_record(
        &self,
        original: EventRecord,
        target: EventType,
        patch: &EventPatch,
        modifier: &str,
    ) -> Result<SavedEvent> {
        let source = original.event_type();
        let moved = self.build_moved(&original, target, patch, modifier)?;

        if let Err(e) = self.repo.delete(original.row_index, source).await {
            return Err(StoreError::MigrationFailure {
                event_id: original.event_id,
                phase: MigrationPhase::Delete,
                data_lost: false,
                reason: e.to_string(),
            });
        }

        let row_index = match self.repo.insert(&moved).await {
            Ok(row_index) => row_index,
            Err(e) => {
                let row = row_for(self.repo.registry().schema(target), &moved);
                error!(
                    event_id = %moved.event_id,
                    from = %source,
                    to = %target,
                    table = self.repo.config().table_name(target),
                    row = ?row,
                    error = %e,
                    "event removed from its old table but could not be recreated"
                );
                return Err(StoreError::MigrationFailure {
                    event_id: moved.event_id,
                    phase: MigrationPhase::Create,
                    data_lost: true,
                    reason: e.to_string(),
                });
            }
        };

        info!(
            event_id = %moved.event_id,
            from = %source,
            to = %target,
            old_row = original.row_index,
            new_row = row_index,
            revision = moved.revision,
            "event moved"
        );
        Ok(SavedEvent {
            event_id: moved.event_id,
            event_type: target,
            row_index,
            revision: moved.revision,
        })
    }

    /// The record as it will be written into the target table
    fn build_moved(
        &self,
        original: &EventRecord,
        target: EventType,
        patch: &EventPatch,
        modifier: &str,
    ) -> Result<EventRecord> {
        let schema = self.repo.registry().schema(target);
        let mut moved = EventRecord::new(target);

        for (key, value) in original.values() {
            if schema.contains(key) {
                moved.set_value(key, &value);
            } else {
                debug!(event_id = %original.event_id, field = %key, "dropping field on type change");
            }
        }
        for (key, value) in &patch.values {
            if !key.is_system_managed() {
                moved.set_value(*key, value);
            }
        }

        moved.event_id = original.event_id.clone();
        moved.revision = next_revision(original.revision)?;
        moved.last_modified_time = format_timestamp(self.repo.now());
        moved.last_modified_by = modifier.to_string();
        if patch.get(FieldKey::CreatedTime).is_none() {
            moved.created_time = original.created_time.clone();
        }
        Ok(moved)
    }
}
