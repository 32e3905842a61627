//! Centralized error types for the transformation layer.

use thiserror::Error;

/// Main error type for iatigraph operations.
#[derive(Error, Debug)]
pub enum IatiGraphError {
    #[error("Database error: {0}")]
    Database(#[from] iatigraph_db::DbError),

    #[error("Integrity violation: {0}")]
    Integrity(String),
}

/// Result type for iatigraph operations.
pub type IatiGraphResult<T> = Result<T, IatiGraphError>;
