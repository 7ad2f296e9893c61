// Error types for the event record store

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Which half of a type-change move failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    /// Removing the row from the original type's table
    Delete,
    /// Recreating the row in the target type's table
    Create,
}

impl std::fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Create => write!(f, "create"),
        }
    }
}

/// Errors that can occur while reading or mutating event records
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or out-of-range argument (e.g. a row index pointing at the header)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No row at the expected physical position
    #[error("row {row_index} not found in table '{table}'")]
    NotFound { table: String, row_index: u32 },

    /// No record with the given identity in any table
    #[error("event not found: {0}")]
    EventNotFound(String),

    /// The underlying table call was rejected
    #[error("store failure: {0}")]
    StoreFailure(String),

    /// A type-change move failed part way through
    #[error("migration of {event_id} failed during {phase} (data lost: {data_lost}): {reason}")]
    MigrationFailure {
        event_id: String,
        phase: MigrationPhase,
        data_lost: bool,
        reason: String,
    },

    /// Invalid schema or configuration
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Create an invalid argument error
    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidArgument(msg.into())
    }

    /// Create a store failure error
    pub fn store(msg: impl Into<String>) -> Self {
        StoreError::StoreFailure(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        StoreError::Configuration(msg.into())
    }

    /// Create a row not found error
    pub fn not_found(table: impl Into<String>, row_index: u32) -> Self {
        StoreError::NotFound {
            table: table.into(),
            row_index,
        }
    }

    /// Whether this error means a record may have been dropped from every table
    pub fn is_data_loss(&self) -> bool {
        matches!(
            self,
            StoreError::MigrationFailure {
                data_lost: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("IoT Events", 7);
        assert_eq!(err.to_string(), "row 7 not found in table 'IoT Events'");
    }

    #[test]
    fn test_data_loss_only_for_create_phase_failures() {
        let lost = StoreError::MigrationFailure {
            event_id: "EVT1".into(),
            phase: MigrationPhase::Create,
            data_lost: true,
            reason: "append rejected".into(),
        };
        let kept = StoreError::MigrationFailure {
            event_id: "EVT1".into(),
            phase: MigrationPhase::Delete,
            data_lost: false,
            reason: "delete rejected".into(),
        };
        assert!(lost.is_data_loss());
        assert!(!kept.is_data_loss());
        assert!(!StoreError::store("boom").is_data_loss());
    }
}
