use holdem_engine::errors::GameError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::TableId;

/// Failures of the persistence boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    NotFound(TableId),
    #[error("Table already exists: {0}")]
    AlreadyExists(TableId),
    #[error("Version conflict: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },
    #[error("Table storage poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Table not found: {0}")]
    TableNotFound(TableId),
    #[error("Table already exists: {0}")]
    TableExists(TableId),
    #[error("Commit still conflicting after {attempts} attempts")]
    Conflict { attempts: u32 },
    #[error("Invalid action: {0}")]
    InvalidAction(#[from] GameError),
    #[error("Store error: {0}")]
    Store(StoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<StoreError> for TableError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => TableError::TableNotFound(id),
            StoreError::AlreadyExists(id) => TableError::TableExists(id),
            other => TableError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_surfaces_as_table_not_found() {
        let err: TableError = StoreError::NotFound("t1".into()).into();
        assert!(matches!(err, TableError::TableNotFound(id) if id == "t1"));
    }

    #[test]
    fn conflicts_stay_store_errors() {
        let err: TableError = StoreError::Conflict { expected: 1, actual: 2 }.into();
        assert_eq!(err.to_string(), "Store error: Version conflict: expected 1, found 2");
    }
}
