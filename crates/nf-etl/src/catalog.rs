//! Catalog transform: projections into the song and artist dimensions.
//!
//! Both projections are row-for-row: nothing is filtered, merged, or
//! deduplicated, so the song dimension always has exactly one row per catalog
//! record and the artist dimension repeats an artist once per record that
//! mentions it.

use nf_core::records::CatalogRecord;
use nf_core::tables::{ArtistRecord, SongRecord};

/// Project catalog records into song dimension rows.
pub fn song_rows(records: &[CatalogRecord]) -> Vec<SongRecord> {
    records
        .iter()
        .map(|r| SongRecord {
            song_id: r.song_id.clone(),
            title: r.title.clone(),
            artist_id: r.artist_id.clone(),
            year: r.year,
            duration: r.duration,
        })
        .collect()
}

/// Project catalog records into artist dimension rows.
pub fn artist_rows(records: &[CatalogRecord]) -> Vec<ArtistRecord> {
    records
        .iter()
        .map(|r| ArtistRecord {
            artist_id: r.artist_id.clone(),
            name: r.artist_name.clone(),
            location: r.artist_location.clone(),
            latitude: r.artist_latitude,
            longitude: r.artist_longitude,
        })
        .collect()
}
