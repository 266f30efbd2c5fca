//! Star-schema row types and table identity.
//!
//! Five output tables: the `songs`, `artists`, `users`, and `time` dimensions
//! and the `songplays` fact. [`Table`] is the single point of truth for table
//! names and partition layout.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The five output tables, in write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Song dimension, partitioned by (year, artist_id)
    Songs,
    /// Artist dimension, unpartitioned
    Artists,
    /// User dimension, unpartitioned
    Users,
    /// Time dimension, partitioned by (year, month)
    Time,
    /// Songplay fact, partitioned by (year, month)
    Songplays,
}

impl Table {
    /// All tables in write order.
    pub const ALL: [Table; 5] = [
        Table::Songs,
        Table::Artists,
        Table::Users,
        Table::Time,
        Table::Songplays,
    ];

    /// Directory name under the output root.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Songs => "songs",
            Table::Artists => "artists",
            Table::Users => "users",
            Table::Time => "time",
            Table::Songplays => "songplays",
        }
    }

    /// Partition key columns, outermost directory first. Empty means
    /// unpartitioned.
    pub fn partition_columns(&self) -> &'static [&'static str] {
        match self {
            Table::Songs => &["year", "artist_id"],
            Table::Artists | Table::Users => &[],
            Table::Time | Table::Songplays => &["year", "month"],
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Row of the `songs` dimension: a straight projection of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

/// Row of the `artists` dimension.
///
/// Not deduplicated: an artist appearing in several catalog records yields
/// one row per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub name: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Row of the `users` dimension.
///
/// Deduplicated by full-row equality, not by user_id: a later level change
/// for the same user keeps both rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub level: String,
}

/// Row of the `time` dimension: one per qualifying event, repeats preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRecord {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    pub day: u32,
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: u32,
}

/// Row of the `songplays` fact.
///
/// `songplay_id` is a content-independent surrogate assigned per row;
/// `year` and `month` are derived from `start_time` for partitioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongplayRecord {
    pub songplay_id: String,
    pub start_time: NaiveDateTime,
    pub user_id: String,
    pub level: String,
    pub song_id: String,
    pub artist_id: String,
    pub session_id: i64,
    pub location: String,
    pub user_agent: String,
    pub year: i32,
    pub month: u32,
}
