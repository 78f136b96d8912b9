//! Error types for the last-value store.

use crate::types::ColumnType;
use thiserror::Error;

/// Result type alias using LastValError.
pub type Result<T> = std::result::Result<T, LastValError>;

/// Errors that can occur while building or probing a last-value store.
///
/// A missing key on lookup is not an error; lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum LastValError {
    // Layout errors
    #[error("Record size is too large: {size} bytes (max {max})")]
    RecordTooLarge { size: usize, max: usize },

    #[error("Unsupported column type: {0}")]
    UnsupportedType(ColumnType),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    // Schema errors
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate key column: {0}")]
    DuplicateKeyColumn(String),

    #[error("Key column {column} type mismatch: master {master}, slave {slave}")]
    KeyTypeMismatch {
        column: String,
        master: ColumnType,
        slave: ColumnType,
    },

    // Symbol errors
    #[error("Symbol table not bound for column {column}")]
    SymbolTableNotBound { column: usize },

    // Memory errors
    #[error("Failed to allocate page of {size} bytes")]
    AllocationFailed { size: usize },

    #[error("Arena offset out of bounds: {offset}")]
    OffsetOutOfBounds { offset: u64 },

    // Lifecycle errors
    #[error("Store is closed")]
    StoreClosed,

    // Configuration errors
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}
