//! End-to-end pipeline tests against a local store.

use std::path::Path;
use std::sync::Arc;

use nf_core::config::Config;
use nf_core::tables::Table;
use nf_core::time::TimezoneMode;
use nf_etl::{pipeline, EtlError};
use nf_store::{LocalStore, TableWriter};
use tempfile::TempDir;

fn catalog_line(song_id: &str, title: &str, artist_id: &str, year: i32) -> String {
    format!(
        r#"{{"song_id": "{song_id}", "title": "{title}", "artist_id": "{artist_id}", "year": {year}, "duration": 152.92, "artist_name": "artist {artist_id}", "artist_location": "Paris", "artist_latitude": 48.85, "artist_longitude": null}}"#
    )
}

fn event_line(page: &str, user_id: &str, level: &str, song: &str, ts: i64, session_id: i64) -> String {
    format!(
        r#"{{"page": "{page}", "ts": {ts}, "userId": "{user_id}", "firstName": "first{user_id}", "lastName": "last{user_id}", "gender": "F", "level": "{level}", "song": "{song}", "sessionId": {session_id}, "location": "LA", "userAgent": "UA1"}}"#
    )
}

// 2018-11-02T01:25:34.796Z
const TS_NOV: i64 = 1_541_121_934_796;
// 2018-12-05T00:00:00Z
const TS_DEC: i64 = 1_543_968_000_000;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Lay out a small project: three catalog records (two by one artist, two
/// sharing a title) and an event log exercising the filter, the dedup, and
/// the join.
fn setup_project(dir: &Path) -> Config {
    let input = dir.join("input");

    write(
        &input,
        "song_data/A/A/A/part1.json",
        &format!(
            "{}\n{}\n",
            catalog_line("SO1", "Intro", "AR1", 1999),
            catalog_line("SO2", "Outro", "AR1", 0)
        ),
    );
    write(
        &input,
        "song_data/A/B/B/part2.json",
        &catalog_line("SO3", "Intro", "AR2", 2005),
    );

    write(
        &input,
        "log_data/2018-11-events.json",
        &[
            // played twice at the same instant: time rows must repeat
            event_line("NextSong", "8", "free", "Intro", TS_NOV, 139),
            event_line("NextSong", "8", "free", "Intro", TS_NOV, 139),
            // same user, level changed: both user rows survive
            event_line("NextSong", "8", "paid", "Outro", TS_DEC, 140),
            // unknown title: no fact row
            event_line("NextSong", "9", "free", "Unknown Title", TS_NOV, 141),
            // not a play: excluded from every table
            event_line("Home", "10", "free", "", TS_NOV, 142),
        ]
        .join("\n"),
    );

    Config {
        name: "pipeline_test".to_string(),
        input_root: "input".to_string(),
        output_root: "output".to_string(),
        catalog_glob: "song_data/*/*/*/*.json".to_string(),
        events_glob: "log_data/*.json".to_string(),
        timezone: TimezoneMode::Utc,
        write_attempts: 1,
        storage: None,
    }
}

fn writer_for(dir: &Path, config: &Config) -> TableWriter {
    let store = Arc::new(LocalStore::new(config.output_root_path(dir)));
    TableWriter::new(store, config.write_attempts)
}

#[tokio::test]
async fn test_full_run_row_counts() {
    let dir = TempDir::new().unwrap();
    let config = setup_project(dir.path());
    let writer = writer_for(dir.path(), &config);

    let summary = pipeline::run(&config, dir.path(), &writer).await.unwrap();

    let rows: Vec<(Table, usize)> = summary.tables.iter().map(|t| (t.table, t.rows)).collect();
    assert_eq!(
        rows,
        vec![
            // one song row per catalog record
            (Table::Songs, 3),
            // artist duplicates preserved (AR1 twice)
            (Table::Artists, 3),
            // user 8 twice (level change), user 9 once; the Home event is out
            (Table::Users, 3),
            // one time row per filtered event, repeats included
            (Table::Time, 4),
            // "Intro" matches two songs (fan-out), twice played; "Outro" once
            (Table::Songplays, 5),
        ]
    );
    assert_eq!(summary.total_rows(), 18);
}

#[tokio::test]
async fn test_fact_rows_carry_join_fields() {
    let dir = TempDir::new().unwrap();
    let config = setup_project(dir.path());
    let writer = writer_for(dir.path(), &config);

    pipeline::run(&config, dir.path(), &writer).await.unwrap();

    let facts = writer.read_songplays().await.unwrap();
    assert_eq!(facts.len(), 5);

    // The lone "Outro" play joined against SO2/AR1.
    let outro: Vec<_> = facts.iter().filter(|f| f.song_id == "SO2").collect();
    assert_eq!(outro.len(), 1);
    assert_eq!(outro[0].artist_id, "AR1");
    assert_eq!(outro[0].user_id, "8");
    assert_eq!(outro[0].level, "paid");
    assert_eq!(outro[0].session_id, 140);
    assert_eq!(outro[0].year, 2018);
    assert_eq!(outro[0].month, 12);
    assert!(!outro[0].songplay_id.is_empty());

    // No fact row references the unmatched title's user session.
    assert!(facts.iter().all(|f| f.session_id != 141));

    // Surrogate ids are unique across the table.
    let mut ids: Vec<_> = facts.iter().map(|f| f.songplay_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), facts.len());
}

#[tokio::test]
async fn test_non_play_events_excluded_everywhere() {
    let dir = TempDir::new().unwrap();
    let config = setup_project(dir.path());
    let writer = writer_for(dir.path(), &config);

    pipeline::run(&config, dir.path(), &writer).await.unwrap();

    let users = writer.read_users().await.unwrap();
    assert!(users.iter().all(|u| u.user_id != "10"));

    let time = writer.read_time().await.unwrap();
    assert_eq!(time.len(), 4);

    let facts = writer.read_songplays().await.unwrap();
    assert!(facts.iter().all(|f| f.user_id != "10"));
}

#[tokio::test]
async fn test_partition_directories_match_row_values() {
    let dir = TempDir::new().unwrap();
    let config = setup_project(dir.path());
    let writer = writer_for(dir.path(), &config);

    pipeline::run(&config, dir.path(), &writer).await.unwrap();
    let output = config.output_root_path(dir.path());

    let mut song_parts = list_dirs(&output.join("songs"));
    song_parts.sort();
    assert_eq!(song_parts, vec!["year=0", "year=1999", "year=2005"]);
    assert_eq!(
        list_dirs(&output.join("songs/year=1999")),
        vec!["artist_id=AR1"]
    );

    // Plays landed in 2018-11 and 2018-12.
    assert_eq!(list_dirs(&output.join("songplays")), vec!["year=2018"]);
    let mut months = list_dirs(&output.join("songplays/year=2018"));
    months.sort();
    assert_eq!(months, vec!["month=11", "month=12"]);

    let mut time_months = list_dirs(&output.join("time/year=2018"));
    time_months.sort();
    assert_eq!(time_months, vec!["month=11", "month=12"]);

    // Unpartitioned tables hold their files directly.
    assert!(output.join("users/part-00000.parquet").is_file());
    assert!(output.join("artists/part-00000.parquet").is_file());
}

#[tokio::test]
async fn test_rerun_overwrites_to_identical_contents() {
    let dir = TempDir::new().unwrap();
    let config = setup_project(dir.path());

    let first_writer = writer_for(dir.path(), &config);
    pipeline::run(&config, dir.path(), &first_writer).await.unwrap();

    let songs_before = first_writer.read_songs().await.unwrap();
    let artists_before = first_writer.read_artists().await.unwrap();
    let users_before = first_writer.read_users().await.unwrap();
    let time_before = first_writer.read_time().await.unwrap();

    let second_writer = writer_for(dir.path(), &config);
    pipeline::run(&config, dir.path(), &second_writer).await.unwrap();

    assert_eq!(second_writer.read_songs().await.unwrap(), songs_before);
    assert_eq!(second_writer.read_artists().await.unwrap(), artists_before);
    assert_eq!(second_writer.read_users().await.unwrap(), users_before);
    assert_eq!(second_writer.read_time().await.unwrap(), time_before);

    // Fact contents match too once the non-deterministic surrogate is ignored.
    let strip = |mut rows: Vec<nf_core::tables::SongplayRecord>| {
        for row in &mut rows {
            row.songplay_id.clear();
        }
        rows.sort_by(|a, b| {
            (a.session_id, &a.song_id, a.start_time).cmp(&(b.session_id, &b.song_id, b.start_time))
        });
        rows
    };
    let facts_first = strip(first_writer.read_songplays().await.unwrap());
    let facts_second = strip(second_writer.read_songplays().await.unwrap());
    assert_eq!(facts_first, facts_second);
}

#[tokio::test]
async fn test_missing_inputs_abort_the_run() {
    let dir = TempDir::new().unwrap();
    let mut config = setup_project(dir.path());
    config.catalog_glob = "nowhere/*.json".to_string();
    let writer = writer_for(dir.path(), &config);

    let result = pipeline::run(&config, dir.path(), &writer).await;
    assert!(matches!(result, Err(EtlError::EmptyInput { .. })));

    // Stage A never completed, so no table exists.
    assert!(!config.output_root_path(dir.path()).join("songs").exists());
}

#[tokio::test]
async fn test_malformed_event_aborts_after_catalog_stage() {
    let dir = TempDir::new().unwrap();
    let config = setup_project(dir.path());
    write(
        &dir.path().join("input"),
        "log_data/2018-12-broken.json",
        "{\"page\": 7}",
    );
    let writer = writer_for(dir.path(), &config);

    let result = pipeline::run(&config, dir.path(), &writer).await;
    assert!(matches!(result, Err(EtlError::SourceParse { .. })));

    // The catalog stage had already written its tables; they stay in place.
    let output = config.output_root_path(dir.path());
    assert!(output.join("songs").is_dir());
    assert!(output.join("artists").is_dir());
    assert!(!output.join("songplays").exists());
}

fn list_dirs(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .unwrap()
        .filter_map(|e| {
            let e = e.unwrap();
            e.path()
                .is_dir()
                .then(|| e.file_name().to_string_lossy().into_owned())
        })
        .collect();
    names.sort();
    names
}
