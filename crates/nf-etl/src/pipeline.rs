//! The two-stage pipeline: catalog tables first, then event tables, with the
//! fact join gated on the persisted song dimension.

use std::path::Path;
use std::time::{Duration, Instant};

use nf_core::config::Config;
use nf_core::records::{CatalogRecord, LogEvent};
use nf_core::tables::Table;
use nf_store::TableWriter;

use crate::catalog;
use crate::error::EtlResult;
use crate::events;
use crate::source;

/// Outcome of one table write.
#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: Table,
    pub rows: usize,
    pub duration: Duration,
}

/// Outcome of a full pipeline run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub tables: Vec<TableReport>,
}

impl RunSummary {
    /// Total rows written across all five tables.
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Run both transforms end to end.
///
/// Stage A persists the song and artist dimensions. Stage B derives the user
/// and time dimensions from the event log, then reads the song dimension back
/// from storage for the fact join: the join never sees an in-memory handoff,
/// which is what enforces the stage ordering. Any failure aborts the run;
/// tables already written stay as written.
pub async fn run(config: &Config, project_root: &Path, writer: &TableWriter) -> EtlResult<RunSummary> {
    let input_root = config.input_root_path(project_root);
    let mut tables = Vec::with_capacity(Table::ALL.len());

    // Stage A: catalog tables.
    let catalog_records: Vec<CatalogRecord> =
        source::read_records(&input_root, &config.catalog_glob)?;
    log::debug!("read {} catalog records", catalog_records.len());

    let songs = catalog::song_rows(&catalog_records);
    let started = Instant::now();
    writer.write_songs(&songs).await?;
    tables.push(TableReport {
        table: Table::Songs,
        rows: songs.len(),
        duration: started.elapsed(),
    });

    let artists = catalog::artist_rows(&catalog_records);
    let started = Instant::now();
    writer.write_artists(&artists).await?;
    tables.push(TableReport {
        table: Table::Artists,
        rows: artists.len(),
        duration: started.elapsed(),
    });

    // Stage B: event tables.
    let raw_events: Vec<LogEvent> = source::read_records(&input_root, &config.events_glob)?;
    let events = events::next_song_events(raw_events);
    log::debug!("{} events after the NextSong filter", events.len());

    let users = events::user_rows(&events);
    let started = Instant::now();
    writer.write_users(&users).await?;
    tables.push(TableReport {
        table: Table::Users,
        rows: users.len(),
        duration: started.elapsed(),
    });

    let time = events::time_rows(&events, config.timezone)?;
    let started = Instant::now();
    writer.write_time(&time).await?;
    tables.push(TableReport {
        table: Table::Time,
        rows: time.len(),
        duration: started.elapsed(),
    });

    // The fact join reads the song dimension back from storage: Stage A's
    // songs write must be visible before this point.
    let persisted_songs = writer.read_songs().await?;
    let songplays = events::songplay_rows(&events, &persisted_songs, config.timezone)?;
    let started = Instant::now();
    writer.write_songplays(&songplays).await?;
    tables.push(TableReport {
        table: Table::Songplays,
        rows: songplays.len(),
        duration: started.elapsed(),
    });

    Ok(RunSummary {
        run_id: writer.run_id().to_string(),
        tables,
    })
}
