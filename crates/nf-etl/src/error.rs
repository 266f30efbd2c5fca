//! Error types for nf-etl

use thiserror::Error;

/// Errors raised while reading sources or deriving tables
#[derive(Error, Debug)]
pub enum EtlError {
    /// T001: Input glob pattern is invalid
    #[error("[T001] Invalid input pattern '{pattern}': {message}")]
    BadPattern { pattern: String, message: String },

    /// T002: Input discovery failed
    #[error("[T002] Failed to list inputs under '{pattern}': {message}")]
    Discovery { pattern: String, message: String },

    /// T003: A source file could not be read
    #[error("[T003] Failed to read '{path}': {source}")]
    SourceIo {
        path: String,
        source: std::io::Error,
    },

    /// T004: A source record failed schema decoding
    #[error("[T004] Failed to parse '{path}': {message}")]
    SourceParse { path: String, message: String },

    /// T005: No input files matched
    #[error("[T005] No input files matched '{pattern}'")]
    EmptyInput { pattern: String },

    /// Core error (config, timestamp decoding)
    #[error(transparent)]
    Core(#[from] nf_core::CoreError),

    /// Storage error from the table store
    #[error(transparent)]
    Store(#[from] nf_store::StoreError),
}

/// Result type alias for EtlError
pub type EtlResult<T> = Result<T, EtlError>;
