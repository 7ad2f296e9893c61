//! TableBackend trait definition
//!
//! The backend is the spreadsheet client: range-addressed reads and writes
//! plus physical row deletion. It has no transactions and no schema; every
//! call commits immediately.

use async_trait::async_trait;
use eventsheet_core::StoreError;

use crate::range::A1Range;

/// Error type for backend calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// No table with this name
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Range string could not be parsed or does not fit the call
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// The backend rejected the call
    #[error("backend rejected {op}: {message}")]
    Rejected { op: BackendOp, message: String },
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        StoreError::StoreFailure(err.to_string())
    }
}

/// Backend call kinds, used for fault injection and error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Get,
    Append,
    Update,
    DeleteRows,
}

impl std::fmt::Display for BackendOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Append => write!(f, "append"),
            Self::Update => write!(f, "update"),
            Self::DeleteRows => write!(f, "delete_rows"),
        }
    }
}

/// Range-addressed access to named tables
///
/// Reads follow spreadsheet conventions: trailing empty cells of a row and
/// trailing empty rows of a range are omitted, so callers must pad.
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Read the values inside `range`
    async fn get(&self, range: &A1Range) -> Result<Vec<Vec<String>>, BackendError>;

    /// Append rows after the last non-empty row; returns the range written
    async fn append(
        &self,
        range: &A1Range,
        rows: Vec<Vec<String>>,
    ) -> Result<A1Range, BackendError>;

    /// Overwrite the cells of `range` starting at its top-left corner
    async fn update(&self, range: &A1Range, rows: Vec<Vec<String>>) -> Result<(), BackendError>;

    /// Physically remove `count` rows starting at 1-based `start`; later rows shift up
    async fn delete_rows(&self, table: &str, start: u32, count: u32) -> Result<(), BackendError>;
}
