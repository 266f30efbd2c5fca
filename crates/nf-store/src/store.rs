//! The table store seam and its local-filesystem backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use nf_core::tables::Table;

/// One partition of encoded rows: the formatted partition key values (in the
/// table's partition-column order) and the Parquet payload. Unpartitioned
/// tables use a single partition with no key values.
pub type EncodedPartition = (Vec<String>, Bytes);

/// Storage abstraction for partitioned tables.
///
/// Implementations must be Send + Sync. A write replaces the whole table and
/// must be atomic from a reader's perspective; nothing is guaranteed across
/// tables.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Replace `table` with the given partitions.
    async fn write_partitions(
        &self,
        table: Table,
        run_id: &str,
        partitions: Vec<EncodedPartition>,
    ) -> StoreResult<()>;

    /// Read every data file of `table`.
    async fn read_parts(&self, table: Table) -> StoreResult<Vec<Bytes>>;

    /// Whether `table` currently exists.
    async fn table_exists(&self, table: Table) -> StoreResult<bool>;

    /// Remove `table` entirely, if present.
    async fn remove_table(&self, table: Table) -> StoreResult<()>;

    /// Store type identifier for logging
    fn store_type(&self) -> &'static str;
}

/// Local-filesystem table store.
///
/// Layout: `<root>/<table>/<col>=<value>/…/part-00000.parquet`. A write
/// stages the whole table under `<table>.tmp-<run-id>`, then swaps it into
/// place with directory renames, so a reader sees either the old table or
/// the new one and never a half-written mix.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Final location of a table.
    pub fn table_path(&self, table: Table) -> PathBuf {
        self.root.join(table.name())
    }

    fn staging_path(&self, table: Table, run_id: &str) -> PathBuf {
        self.root.join(format!("{}.tmp-{run_id}", table.name()))
    }

    fn retired_path(&self, table: Table, run_id: &str) -> PathBuf {
        self.root.join(format!("{}.old-{run_id}", table.name()))
    }

    fn write_partitions_sync(
        &self,
        table: Table,
        run_id: &str,
        partitions: &[EncodedPartition],
    ) -> StoreResult<()> {
        let staging = self.staging_path(table, run_id);
        if staging.exists() {
            // Residue from an earlier failed attempt of the same run.
            std::fs::remove_dir_all(&staging).map_err(|e| io_error(&staging, e))?;
        }
        std::fs::create_dir_all(&staging).map_err(|e| io_error(&staging, e))?;

        let columns = table.partition_columns();
        for (values, bytes) in partitions {
            if values.len() != columns.len() {
                return Err(StoreError::CorruptTable {
                    table: table.name().to_string(),
                    message: format!(
                        "partition key has {} values, table has {} partition columns",
                        values.len(),
                        columns.len()
                    ),
                });
            }

            let mut dir = staging.clone();
            for (column, value) in columns.iter().zip(values) {
                dir.push(partition_segment(column, value));
            }
            std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

            let file = dir.join("part-00000.parquet");
            std::fs::write(&file, bytes).map_err(|e| io_error(&file, e))?;
        }

        let target = self.table_path(table);
        let retired = self.retired_path(table, run_id);
        if target.exists() {
            std::fs::rename(&target, &retired).map_err(|e| io_error(&target, e))?;
        }
        std::fs::rename(&staging, &target).map_err(|e| io_error(&staging, e))?;

        if retired.exists() {
            if let Err(e) = std::fs::remove_dir_all(&retired) {
                log::warn!(
                    "failed to remove retired table at {}: {e}",
                    retired.display()
                );
            }
        }

        Ok(())
    }

    fn read_parts_sync(&self, table: Table) -> StoreResult<Vec<Bytes>> {
        let target = self.table_path(table);
        if !target.is_dir() {
            return Err(StoreError::TableNotFound {
                table: table.name().to_string(),
            });
        }

        let mut files = Vec::new();
        collect_parquet_files(&target, &mut files)?;
        // Sort for a deterministic read order across platforms.
        files.sort();

        let mut parts = Vec::with_capacity(files.len());
        for file in files {
            let content = std::fs::read(&file).map_err(|e| io_error(&file, e))?;
            parts.push(Bytes::from(content));
        }
        Ok(parts)
    }
}

#[async_trait]
impl TableStore for LocalStore {
    async fn write_partitions(
        &self,
        table: Table,
        run_id: &str,
        partitions: Vec<EncodedPartition>,
    ) -> StoreResult<()> {
        self.write_partitions_sync(table, run_id, &partitions)
    }

    async fn read_parts(&self, table: Table) -> StoreResult<Vec<Bytes>> {
        self.read_parts_sync(table)
    }

    async fn table_exists(&self, table: Table) -> StoreResult<bool> {
        Ok(self.table_path(table).is_dir())
    }

    async fn remove_table(&self, table: Table) -> StoreResult<()> {
        let target = self.table_path(table);
        if target.exists() {
            std::fs::remove_dir_all(&target).map_err(|e| io_error(&target, e))?;
        }
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "local"
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Hive-style partition directory name. Path separators in values are
/// replaced so a value can never escape the table directory.
fn partition_segment(column: &str, value: &str) -> String {
    let safe: String = value
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{column}={safe}")
}

fn collect_parquet_files(dir: &Path, files: &mut Vec<PathBuf>) -> StoreResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_parquet_files(&path, files)?;
        } else if path.extension().is_some_and(|e| e == "parquet") {
            files.push(path);
        } else {
            log::debug!("ignoring non-parquet file: {}", path.display());
        }
    }
    Ok(())
}
