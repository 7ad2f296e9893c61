//! Tabular record store
//!
//! Row-level operations on a named table: every row is a list of string cells
//! laid out by a fixed column list. Row 1 is the header; data rows start at 2.
//! Rows read back are always padded to the requested width because the
//! backend omits trailing empty cells.

use std::sync::Arc;

use eventsheet_core::{Result, StoreError};
use tracing::debug;

use crate::backend::TableBackend;
use crate::range::A1Range;

/// First row holding data; row 1 is the header
pub const FIRST_DATA_ROW: u32 = 2;

/// Generic row store over a TableBackend
#[derive(Clone)]
pub struct TabularStore {
    backend: Arc<dyn TableBackend>,
}

impl TabularStore {
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self { backend }
    }

    /// Append a row after the last non-empty row; returns its 1-based index
    pub async fn append(&self, table: &str, row: Vec<String>) -> Result<u32> {
        let width = row.len();
        let written = self
            .backend
            .append(&A1Range::open(table, 1, width), vec![row])
            .await?;
        debug!(table, row_index = written.start_row, "appended row");
        Ok(written.start_row)
    }

    /// Read one data row padded to `width`
    ///
    /// A missing or fully blank row is `NotFound`; the header row and row 0
    /// are `InvalidArgument`.
    pub async fn read_row(&self, table: &str, row_index: u32, width: usize) -> Result<Vec<String>> {
        check_data_row(row_index)?;
        let values = self
            .backend
            .get(&A1Range::row(table, row_index, width))
            .await?;
        match values.into_iter().next() {
            Some(row) if row.iter().any(|c| !c.is_empty()) => Ok(pad(row, width)),
            _ => Err(StoreError::not_found(table, row_index)),
        }
    }

    /// Overwrite a data row in place; no schema validation
    pub async fn write_row(&self, table: &str, row_index: u32, row: Vec<String>) -> Result<()> {
        check_data_row(row_index)?;
        let range = A1Range::row(table, row_index, row.len());
        self.backend.update(&range, vec![row]).await?;
        debug!(table, row_index, "wrote row");
        Ok(())
    }

    /// Physically remove a data row; later rows move up by one
    ///
    /// Deleting past the end of the table is a no-op.
    pub async fn delete_row(&self, table: &str, row_index: u32) -> Result<()> {
        check_data_row(row_index)?;
        self.backend.delete_rows(table, row_index, 1).await?;
        debug!(table, row_index, "deleted row");
        Ok(())
    }

    /// Every non-blank data row padded to `width`, paired with its row index
    pub async fn read_all(&self, table: &str, width: usize) -> Result<Vec<(u32, Vec<String>)>> {
        let values = self
            .backend
            .get(&A1Range::open(table, FIRST_DATA_ROW, width))
            .await?;
        let rows: Vec<(u32, Vec<String>)> = values
            .into_iter()
            .zip(FIRST_DATA_ROW..)
            .filter(|(row, _)| row.iter().any(|c| !c.is_empty()))
            .map(|(row, index)| (index, pad(row, width)))
            .collect();
        debug!(table, rows = rows.len(), "read table");
        Ok(rows)
    }

    /// Header row padded to `width`; empty cells when the table has no header
    pub async fn read_header(&self, table: &str, width: usize) -> Result<Vec<String>> {
        let values = self.backend.get(&A1Range::row(table, 1, width)).await?;
        Ok(pad(values.into_iter().next().unwrap_or_default(), width))
    }

    pub async fn write_header(&self, table: &str, labels: &[&str]) -> Result<()> {
        let row: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        let range = A1Range::row(table, 1, row.len());
        self.backend.update(&range, vec![row]).await?;
        debug!(table, columns = labels.len(), "wrote header");
        Ok(())
    }
}

impl std::fmt::Debug for TabularStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabularStore").finish_non_exhaustive()
    }
}

fn check_data_row(row_index: u32) -> Result<()> {
    if row_index < FIRST_DATA_ROW {
        return Err(StoreError::invalid(format!(
            "row index must be greater than 1, got {row_index}"
        )));
    }
    Ok(())
}

fn pad(mut row: Vec<String>, width: usize) -> Vec<String> {
    if row.len() < width {
        row.resize(width, String::new());
    }
    row
}
