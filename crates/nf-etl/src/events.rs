//! Event transform: filter, user dedup, time derivation, and the fact join.
//!
//! The four stages run in a fixed order. The filter feeds everything else;
//! the join additionally needs the persisted song dimension, which the
//! orchestrator reads back from storage after the catalog stage has written
//! it.

use std::collections::{HashMap, HashSet};

use chrono::Datelike;
use uuid::Uuid;

use nf_core::records::LogEvent;
use nf_core::tables::{SongRecord, SongplayRecord, TimeRecord, UserRecord};
use nf_core::time::{decode_epoch_ms, TimezoneMode};

use crate::error::EtlResult;

/// Keep only song-play events; everything else contributes to no table.
pub fn next_song_events(events: Vec<LogEvent>) -> Vec<LogEvent> {
    events.into_iter().filter(|e| e.is_next_song()).collect()
}

/// Project filtered events into user rows, removing exact duplicates.
///
/// The dedup key is the whole row: two events for one user that differ only
/// in `level` keep both rows. First-occurrence order is preserved.
pub fn user_rows(events: &[LogEvent]) -> Vec<UserRecord> {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for event in events {
        let row = UserRecord {
            user_id: event.user_id.clone(),
            first_name: event.first_name.clone(),
            last_name: event.last_name.clone(),
            gender: event.gender.clone(),
            level: event.level.clone(),
        };
        if seen.insert(row.clone()) {
            rows.push(row);
        }
    }
    rows
}

/// Derive one time dimension row per filtered event, repeats preserved.
pub fn time_rows(events: &[LogEvent], zone: TimezoneMode) -> EtlResult<Vec<TimeRecord>> {
    events
        .iter()
        .map(|event| {
            let start_time = decode_epoch_ms(event.ts, zone)?;
            Ok(TimeRecord::from_start_time(start_time))
        })
        .collect()
}

/// Join filtered events against the persisted song dimension on exact title
/// equality and emit fact rows.
///
/// A song title with no match contributes nothing; a title carried by several
/// song rows fans out to one fact row per match. Each row gets a fresh random
/// surrogate id, so fact output is not reproducible across runs.
pub fn songplay_rows(
    events: &[LogEvent],
    songs: &[SongRecord],
    zone: TimezoneMode,
) -> EtlResult<Vec<SongplayRecord>> {
    let mut by_title: HashMap<&str, Vec<&SongRecord>> = HashMap::new();
    for song in songs {
        by_title.entry(song.title.as_str()).or_default().push(song);
    }

    let mut rows = Vec::new();
    for event in events {
        let Some(matches) = by_title.get(event.song.as_str()) else {
            continue;
        };
        let start_time = decode_epoch_ms(event.ts, zone)?;
        for song in matches {
            rows.push(SongplayRecord {
                songplay_id: Uuid::new_v4().to_string(),
                start_time,
                user_id: event.user_id.clone(),
                level: event.level.clone(),
                song_id: song.song_id.clone(),
                artist_id: song.artist_id.clone(),
                session_id: event.session_id,
                location: event.location.clone(),
                user_agent: event.user_agent.clone(),
                year: start_time.year(),
                month: start_time.month(),
            });
        }
    }
    Ok(rows)
}
