//! Epoch-millisecond timestamp decoding and calendar decomposition.

use chrono::{Datelike, Local, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::tables::TimeRecord;

/// Zone used to decode epoch timestamps into wall-clock time.
///
/// With `Local`, the decoded wall clock depends on the host's zone
/// configuration. `Utc` pins the decode so output is identical across hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimezoneMode {
    /// Host-local zone (default)
    #[default]
    Local,
    /// Coordinated Universal Time
    Utc,
}

impl std::fmt::Display for TimezoneMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimezoneMode::Local => write!(f, "local"),
            TimezoneMode::Utc => write!(f, "utc"),
        }
    }
}

/// Decode an epoch time in milliseconds to a wall-clock timestamp in the
/// selected zone. Sub-second precision is preserved.
pub fn decode_epoch_ms(millis: i64, zone: TimezoneMode) -> CoreResult<NaiveDateTime> {
    let decoded = match zone {
        TimezoneMode::Local => Local
            .timestamp_millis_opt(millis)
            .single()
            .map(|dt| dt.naive_local()),
        TimezoneMode::Utc => Utc
            .timestamp_millis_opt(millis)
            .single()
            .map(|dt| dt.naive_utc()),
    };
    decoded.ok_or(CoreError::TimestampOutOfRange { millis })
}

impl TimeRecord {
    /// Decompose a decoded timestamp into the time dimension fields.
    ///
    /// `week` is the ISO week of year; `weekday` is numbered Sunday = 1
    /// through Saturday = 7.
    pub fn from_start_time(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday().number_from_sunday(),
        }
    }
}
