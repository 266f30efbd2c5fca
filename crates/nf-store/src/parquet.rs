//! Parquet encoding/decoding for the five star-schema tables.
//!
//! The schemas here are the storage contract for the table directories.
//! Partition key columns are kept in the data files as well, so reading a
//! table back never requires parsing directory names.

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{
    Array as _, Float64Array, Int32Array, Int64Array, StringArray, TimestampMillisecondArray,
    UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::error::{StoreError, StoreResult};
use nf_core::tables::{ArtistRecord, SongRecord, SongplayRecord, Table, TimeRecord, UserRecord};

fn songs_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("song_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("artist_id", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("duration", DataType::Float64, false),
    ]))
}

fn artists_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("artist_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("location", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, true),
        Field::new("longitude", DataType::Float64, true),
    ]))
}

fn users_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("user_id", DataType::Utf8, false),
        Field::new("first_name", DataType::Utf8, false),
        Field::new("last_name", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("level", DataType::Utf8, false),
    ]))
}

fn time_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(
            "start_time",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new("hour", DataType::UInt32, false),
        Field::new("day", DataType::UInt32, false),
        Field::new("week", DataType::UInt32, false),
        Field::new("month", DataType::UInt32, false),
        Field::new("year", DataType::Int32, false),
        Field::new("weekday", DataType::UInt32, false),
    ]))
}

fn songplays_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("songplay_id", DataType::Utf8, false),
        Field::new(
            "start_time",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new("user_id", DataType::Utf8, false),
        Field::new("level", DataType::Utf8, false),
        Field::new("song_id", DataType::Utf8, false),
        Field::new("artist_id", DataType::Utf8, false),
        Field::new("session_id", DataType::Int64, false),
        Field::new("location", DataType::Utf8, false),
        Field::new("user_agent", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::UInt32, false),
    ]))
}

fn encode_batch(table: Table, schema: Arc<Schema>, batch: &RecordBatch) -> StoreResult<Bytes> {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let props = WriterProperties::builder().build();
    let mut writer =
        ArrowWriter::try_new(&mut cursor, schema, Some(props)).map_err(|e| StoreError::Encode {
            table: table.name().to_string(),
            message: format!("parquet writer init failed: {e}"),
        })?;
    writer.write(batch).map_err(|e| StoreError::Encode {
        table: table.name().to_string(),
        message: format!("parquet write failed: {e}"),
    })?;
    writer.close().map_err(|e| StoreError::Encode {
        table: table.name().to_string(),
        message: format!("parquet close failed: {e}"),
    })?;
    Ok(Bytes::from(cursor.into_inner()))
}

fn batch_error(table: Table, e: arrow::error::ArrowError) -> StoreError {
    StoreError::Encode {
        table: table.name().to_string(),
        message: format!("record batch build failed: {e}"),
    }
}

fn millis(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_millis()
}

fn from_millis(table: Table, value: i64) -> StoreResult<NaiveDateTime> {
    chrono::DateTime::from_timestamp_millis(value)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| StoreError::CorruptTable {
            table: table.name().to_string(),
            message: format!("start_time out of range: {value}"),
        })
}

/// Encode song dimension rows.
pub fn encode_songs(rows: &[SongRecord]) -> StoreResult<Bytes> {
    let schema = songs_schema();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.song_id.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.artist_id.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Int32Array::from(
                rows.iter().map(|r| r.year).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.duration).collect::<Vec<_>>(),
            )),
        ],
    )
    .map_err(|e| batch_error(Table::Songs, e))?;

    encode_batch(Table::Songs, schema, &batch)
}

/// Encode artist dimension rows.
pub fn encode_artists(rows: &[ArtistRecord]) -> StoreResult<Bytes> {
    let schema = artists_schema();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.artist_id.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.location.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.latitude).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.longitude).collect::<Vec<_>>(),
            )),
        ],
    )
    .map_err(|e| batch_error(Table::Artists, e))?;

    encode_batch(Table::Artists, schema, &batch)
}

/// Encode user dimension rows.
pub fn encode_users(rows: &[UserRecord]) -> StoreResult<Bytes> {
    let schema = users_schema();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.user_id.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter()
                    .map(|r| r.first_name.as_str())
                    .collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.last_name.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.gender.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.level.as_str()).collect::<Vec<_>>(),
            )),
        ],
    )
    .map_err(|e| batch_error(Table::Users, e))?;

    encode_batch(Table::Users, schema, &batch)
}

/// Encode time dimension rows.
pub fn encode_time(rows: &[TimeRecord]) -> StoreResult<Bytes> {
    let schema = time_schema();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(TimestampMillisecondArray::from(
                rows.iter().map(|r| millis(r.start_time)).collect::<Vec<_>>(),
            )),
            Arc::new(UInt32Array::from(
                rows.iter().map(|r| r.hour).collect::<Vec<_>>(),
            )),
            Arc::new(UInt32Array::from(
                rows.iter().map(|r| r.day).collect::<Vec<_>>(),
            )),
            Arc::new(UInt32Array::from(
                rows.iter().map(|r| r.week).collect::<Vec<_>>(),
            )),
            Arc::new(UInt32Array::from(
                rows.iter().map(|r| r.month).collect::<Vec<_>>(),
            )),
            Arc::new(Int32Array::from(
                rows.iter().map(|r| r.year).collect::<Vec<_>>(),
            )),
            Arc::new(UInt32Array::from(
                rows.iter().map(|r| r.weekday).collect::<Vec<_>>(),
            )),
        ],
    )
    .map_err(|e| batch_error(Table::Time, e))?;

    encode_batch(Table::Time, schema, &batch)
}

/// Encode songplay fact rows.
pub fn encode_songplays(rows: &[SongplayRecord]) -> StoreResult<Bytes> {
    let schema = songplays_schema();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter()
                    .map(|r| r.songplay_id.as_str())
                    .collect::<Vec<_>>(),
            )),
            Arc::new(TimestampMillisecondArray::from(
                rows.iter().map(|r| millis(r.start_time)).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.user_id.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.level.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.song_id.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.artist_id.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.session_id).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.location.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.user_agent.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Int32Array::from(
                rows.iter().map(|r| r.year).collect::<Vec<_>>(),
            )),
            Arc::new(UInt32Array::from(
                rows.iter().map(|r| r.month).collect::<Vec<_>>(),
            )),
        ],
    )
    .map_err(|e| batch_error(Table::Songplays, e))?;

    encode_batch(Table::Songplays, schema, &batch)
}

fn read_batches(table: Table, bytes: &Bytes) -> StoreResult<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes.clone())
        .map_err(|e| StoreError::Decode {
            table: table.name().to_string(),
            message: format!("parquet reader init failed: {e}"),
        })?
        .build()
        .map_err(|e| StoreError::Decode {
            table: table.name().to_string(),
            message: format!("parquet reader build failed: {e}"),
        })?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| StoreError::Decode {
            table: table.name().to_string(),
            message: format!("parquet read batch failed: {e}"),
        })?;
        batches.push(batch);
    }
    Ok(batches)
}

fn column<'a, A: 'static>(table: Table, batch: &'a RecordBatch, name: &str) -> StoreResult<&'a A> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|e| StoreError::CorruptTable {
            table: table.name().to_string(),
            message: format!("missing column '{name}': {e}"),
        })?;

    batch
        .column(idx)
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| StoreError::CorruptTable {
            table: table.name().to_string(),
            message: format!("column '{name}' has unexpected type"),
        })
}

/// Decode song dimension rows.
pub fn decode_songs(bytes: &Bytes) -> StoreResult<Vec<SongRecord>> {
    let table = Table::Songs;
    let mut out = Vec::new();
    for batch in read_batches(table, bytes)? {
        let song_id: &StringArray = column(table, &batch, "song_id")?;
        let title: &StringArray = column(table, &batch, "title")?;
        let artist_id: &StringArray = column(table, &batch, "artist_id")?;
        let year: &Int32Array = column(table, &batch, "year")?;
        let duration: &Float64Array = column(table, &batch, "duration")?;

        for row in 0..batch.num_rows() {
            out.push(SongRecord {
                song_id: song_id.value(row).to_string(),
                title: title.value(row).to_string(),
                artist_id: artist_id.value(row).to_string(),
                year: year.value(row),
                duration: duration.value(row),
            });
        }
    }
    Ok(out)
}

/// Decode artist dimension rows.
pub fn decode_artists(bytes: &Bytes) -> StoreResult<Vec<ArtistRecord>> {
    let table = Table::Artists;
    let mut out = Vec::new();
    for batch in read_batches(table, bytes)? {
        let artist_id: &StringArray = column(table, &batch, "artist_id")?;
        let name: &StringArray = column(table, &batch, "name")?;
        let location: &StringArray = column(table, &batch, "location")?;
        let latitude: &Float64Array = column(table, &batch, "latitude")?;
        let longitude: &Float64Array = column(table, &batch, "longitude")?;

        for row in 0..batch.num_rows() {
            out.push(ArtistRecord {
                artist_id: artist_id.value(row).to_string(),
                name: name.value(row).to_string(),
                location: location.value(row).to_string(),
                latitude: (!latitude.is_null(row)).then(|| latitude.value(row)),
                longitude: (!longitude.is_null(row)).then(|| longitude.value(row)),
            });
        }
    }
    Ok(out)
}

/// Decode user dimension rows.
pub fn decode_users(bytes: &Bytes) -> StoreResult<Vec<UserRecord>> {
    let table = Table::Users;
    let mut out = Vec::new();
    for batch in read_batches(table, bytes)? {
        let user_id: &StringArray = column(table, &batch, "user_id")?;
        let first_name: &StringArray = column(table, &batch, "first_name")?;
        let last_name: &StringArray = column(table, &batch, "last_name")?;
        let gender: &StringArray = column(table, &batch, "gender")?;
        let level: &StringArray = column(table, &batch, "level")?;

        for row in 0..batch.num_rows() {
            out.push(UserRecord {
                user_id: user_id.value(row).to_string(),
                first_name: first_name.value(row).to_string(),
                last_name: last_name.value(row).to_string(),
                gender: gender.value(row).to_string(),
                level: level.value(row).to_string(),
            });
        }
    }
    Ok(out)
}

/// Decode time dimension rows.
pub fn decode_time(bytes: &Bytes) -> StoreResult<Vec<TimeRecord>> {
    let table = Table::Time;
    let mut out = Vec::new();
    for batch in read_batches(table, bytes)? {
        let start_time: &TimestampMillisecondArray = column(table, &batch, "start_time")?;
        let hour: &UInt32Array = column(table, &batch, "hour")?;
        let day: &UInt32Array = column(table, &batch, "day")?;
        let week: &UInt32Array = column(table, &batch, "week")?;
        let month: &UInt32Array = column(table, &batch, "month")?;
        let year: &Int32Array = column(table, &batch, "year")?;
        let weekday: &UInt32Array = column(table, &batch, "weekday")?;

        for row in 0..batch.num_rows() {
            out.push(TimeRecord {
                start_time: from_millis(table, start_time.value(row))?,
                hour: hour.value(row),
                day: day.value(row),
                week: week.value(row),
                month: month.value(row),
                year: year.value(row),
                weekday: weekday.value(row),
            });
        }
    }
    Ok(out)
}

/// Decode songplay fact rows.
pub fn decode_songplays(bytes: &Bytes) -> StoreResult<Vec<SongplayRecord>> {
    let table = Table::Songplays;
    let mut out = Vec::new();
    for batch in read_batches(table, bytes)? {
        let songplay_id: &StringArray = column(table, &batch, "songplay_id")?;
        let start_time: &TimestampMillisecondArray = column(table, &batch, "start_time")?;
        let user_id: &StringArray = column(table, &batch, "user_id")?;
        let level: &StringArray = column(table, &batch, "level")?;
        let song_id: &StringArray = column(table, &batch, "song_id")?;
        let artist_id: &StringArray = column(table, &batch, "artist_id")?;
        let session_id: &Int64Array = column(table, &batch, "session_id")?;
        let location: &StringArray = column(table, &batch, "location")?;
        let user_agent: &StringArray = column(table, &batch, "user_agent")?;
        let year: &Int32Array = column(table, &batch, "year")?;
        let month: &UInt32Array = column(table, &batch, "month")?;

        for row in 0..batch.num_rows() {
            out.push(SongplayRecord {
                songplay_id: songplay_id.value(row).to_string(),
                start_time: from_millis(table, start_time.value(row))?,
                user_id: user_id.value(row).to_string(),
                level: level.value(row).to_string(),
                song_id: song_id.value(row).to_string(),
                artist_id: artist_id.value(row).to_string(),
                session_id: session_id.value(row),
                location: location.value(row).to_string(),
                user_agent: user_agent.value(row).to_string(),
                year: year.value(row),
                month: month.value(row),
            });
        }
    }
    Ok(out)
}
