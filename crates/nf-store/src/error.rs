//! Error types for nf-store

use thiserror::Error;

/// Table storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// S001: Parquet encode failed
    #[error("[S001] Parquet encode failed for '{table}': {message}")]
    Encode { table: String, message: String },

    /// S002: Parquet decode failed
    #[error("[S002] Parquet decode failed for '{table}': {message}")]
    Decode { table: String, message: String },

    /// S003: Stored table does not match its expected layout
    #[error("[S003] Corrupt table '{table}': {message}")]
    CorruptTable { table: String, message: String },

    /// S004: Table not found at its expected location
    #[error("[S004] Table not found: {table}")]
    TableNotFound { table: String },

    /// S005: IO error with path context
    #[error("[S005] Storage IO at '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// S006: Write retries exhausted
    #[error("[S006] Write of '{table}' failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        table: String,
        attempts: u32,
        source: Box<StoreError>,
    },
}

/// Result type alias for StoreError
pub type StoreResult<T> = Result<T, StoreError>;
