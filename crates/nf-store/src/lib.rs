//! nf-store - Partitioned columnar table storage for Noteflow
//!
//! Tables are directories of Parquet files, optionally organized into
//! `key=value` partition subdirectories. Every write is a full overwrite,
//! atomic per table from a reader's perspective.

pub mod error;
pub mod parquet;
pub mod store;
pub mod writer;

pub use error::{StoreError, StoreResult};
pub use store::{LocalStore, TableStore};
pub use writer::TableWriter;
