//! Raw input record types for the two JSON sources.
//!
//! Field names match the raw data exactly (snake_case in catalog files,
//! camelCase in the event log). A record missing a required field fails
//! deserialization, which fails the run: there is no per-record skip.

use serde::{Deserialize, Deserializer, Serialize};

/// One song/artist record from the catalog source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
    pub artist_name: String,
    pub artist_location: String,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
}

/// One event from the listening log.
///
/// Only events with `page == "NextSong"` represent a play; the event
/// transform discards everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub page: String,
    /// Epoch milliseconds; the raw data carries both integer and float forms.
    #[serde(deserialize_with = "epoch_millis")]
    pub ts: i64,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub gender: String,
    pub level: String,
    pub song: String,
    #[serde(rename = "sessionId")]
    pub session_id: i64,
    pub location: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

impl LogEvent {
    /// Whether this event is a song play.
    pub fn is_next_song(&self) -> bool {
        self.page == "NextSong"
    }
}

/// Accepts integer or float epoch-millisecond values.
fn epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Number::deserialize(deserializer)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid epoch milliseconds: {value}")))
}
