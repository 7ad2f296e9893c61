//! In-memory implementation of TableBackend for testing
//!
//! Behaves like the spreadsheet API where it matters to the store: reads omit
//! trailing empty cells and trailing empty rows, appends land after the last
//! non-empty row, and deleting rows compacts the table.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::backend::{BackendError, BackendOp, TableBackend};
use crate::range::A1Range;

/// In-memory spreadsheet with named tables
///
/// # Example
///
/// ```
/// use eventsheet_storage::InMemorySheet;
///
/// let sheet = InMemorySheet::new();
/// sheet.create_table("Events", &["Event ID", "Event Name"]);
/// assert_eq!(sheet.rows("Events").len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySheet {
    tables: RwLock<HashMap<String, Vec<Vec<String>>>>,
    failures: Mutex<HashSet<BackendOp>>,
    writes: AtomicUsize,
}

impl InMemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table; a non-empty header becomes row 1
    pub fn create_table(&self, name: &str, header: &[&str]) {
        let mut rows = Vec::new();
        if !header.is_empty() {
            rows.push(trimmed(header.iter().map(|h| h.to_string()).collect()));
        }
        self.tables.write().insert(name.to_string(), rows);
    }

    /// Snapshot of a table's stored rows (row 1 first), trailing cells trimmed
    pub fn rows(&self, name: &str) -> Vec<Vec<String>> {
        self.tables.read().get(name).cloned().unwrap_or_default()
    }

    /// Stored cells of one 1-based row, if present
    pub fn row(&self, name: &str, row_index: u32) -> Option<Vec<String>> {
        let tables = self.tables.read();
        let rows = tables.get(name)?;
        rows.get(row_index.checked_sub(1)? as usize).cloned()
    }

    /// Overwrite a row directly, bypassing counters and fault injection
    pub fn seed_row(&self, name: &str, row_index: u32, cells: &[&str]) {
        let mut tables = self.tables.write();
        let rows = tables.entry(name.to_string()).or_default();
        let pos = row_index.saturating_sub(1) as usize;
        if rows.len() <= pos {
            rows.resize(pos + 1, Vec::new());
        }
        rows[pos] = trimmed(cells.iter().map(|c| c.to_string()).collect());
    }

    /// Number of mutating calls (append, update, delete_rows) that succeeded
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next call of `op` fail once
    pub fn fail_next(&self, op: BackendOp) {
        self.failures.lock().insert(op);
    }

    fn check_fault(&self, op: BackendOp) -> Result<(), BackendError> {
        if self.failures.lock().remove(&op) {
            return Err(BackendError::Rejected {
                op,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TableBackend for InMemorySheet {
    async fn get(&self, range: &A1Range) -> Result<Vec<Vec<String>>, BackendError> {
        self.check_fault(BackendOp::Get)?;
        let tables = self.tables.read();
        let rows = tables
            .get(&range.table)
            .ok_or_else(|| BackendError::TableNotFound(range.table.clone()))?;

        let start = range.start_row.saturating_sub(1) as usize;
        let end = range
            .end_row
            .map(|e| e as usize)
            .unwrap_or(rows.len())
            .min(rows.len());

        let mut values: Vec<Vec<String>> = rows
            .get(start..end.max(start))
            .unwrap_or_default()
            .iter()
            .map(|row| trimmed(row.iter().take(range.width).cloned().collect()))
            .collect();
        while values.last().is_some_and(Vec::is_empty) {
            values.pop();
        }
        Ok(values)
    }

    async fn append(
        &self,
        range: &A1Range,
        new_rows: Vec<Vec<String>>,
    ) -> Result<A1Range, BackendError> {
        self.check_fault(BackendOp::Append)?;
        if new_rows.iter().any(|r| r.len() > range.width) {
            return Err(BackendError::InvalidRange(format!(
                "row wider than {range}"
            )));
        }
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(&range.table)
            .ok_or_else(|| BackendError::TableNotFound(range.table.clone()))?;

        let content_end = rows
            .iter()
            .rposition(|r| !r.is_empty())
            .map(|p| p + 1)
            .unwrap_or(0);
        rows.truncate(content_end);

        let start = content_end as u32 + 1;
        let count = new_rows.len() as u32;
        rows.extend(new_rows.into_iter().map(trimmed));
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(A1Range::rows(
            range.table.clone(),
            start,
            start + count.saturating_sub(1),
            range.width,
        ))
    }

    async fn update(&self, range: &A1Range, new_rows: Vec<Vec<String>>) -> Result<(), BackendError> {
        self.check_fault(BackendOp::Update)?;
        if new_rows.iter().any(|r| r.len() > range.width)
            || range.height().is_some_and(|h| new_rows.len() > h as usize)
        {
            return Err(BackendError::InvalidRange(format!(
                "values do not fit {range}"
            )));
        }
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(&range.table)
            .ok_or_else(|| BackendError::TableNotFound(range.table.clone()))?;

        let start = range.start_row.saturating_sub(1) as usize;
        for (offset, values) in new_rows.into_iter().enumerate() {
            let pos = start + offset;
            if rows.len() <= pos {
                rows.resize(pos + 1, Vec::new());
            }
            let row = &mut rows[pos];
            if row.len() < values.len() {
                row.resize(values.len(), String::new());
            }
            for (cell, value) in row.iter_mut().zip(values) {
                *cell = value;
            }
            *row = trimmed(std::mem::take(row));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_rows(&self, table: &str, start: u32, count: u32) -> Result<(), BackendError> {
        self.check_fault(BackendOp::DeleteRows)?;
        if start == 0 {
            return Err(BackendError::InvalidRange(format!("{table}!row 0")));
        }
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| BackendError::TableNotFound(table.to_string()))?;

        let from = (start - 1) as usize;
        if from < rows.len() {
            let to = (from + count as usize).min(rows.len());
            rows.drain(from..to);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Drop trailing empty cells, as the spreadsheet API does on read
fn trimmed(mut row: Vec<String>) -> Vec<String> {
    while row.last().is_some_and(|c| c.is_empty()) {
        row.pop();
    }
    row
}
