//! JSON source discovery and parsing.
//!
//! Inputs are trees of `.json` files matched by a glob pattern, each file
//! holding either one JSON array or newline-delimited records. Any unreadable
//! file or undecodable record fails the run: there is no per-record skip and
//! no quarantine.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, EtlResult};

/// Expand `pattern` relative to `root` into a sorted list of files.
///
/// Zero matches is an error: an empty source means a misconfigured run, not
/// an empty dataset.
pub fn discover(root: &Path, pattern: &str) -> EtlResult<Vec<PathBuf>> {
    let full = root.join(pattern).to_string_lossy().into_owned();
    let entries = glob::glob(&full).map_err(|e| EtlError::BadPattern {
        pattern: full.clone(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| EtlError::Discovery {
            pattern: full.clone(),
            message: e.to_string(),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    // Sort for a deterministic read order across platforms.
    files.sort();

    if files.is_empty() {
        return Err(EtlError::EmptyInput { pattern: full });
    }
    Ok(files)
}

/// Read every record of type `T` from the files matching `pattern`.
pub fn read_records<T: DeserializeOwned>(root: &Path, pattern: &str) -> EtlResult<Vec<T>> {
    let mut records = Vec::new();
    for path in discover(root, pattern)? {
        parse_file(&path, &mut records)?;
    }
    Ok(records)
}

/// Parse one file as a JSON array or as newline-delimited records.
fn parse_file<T: DeserializeOwned>(path: &Path, out: &mut Vec<T>) -> EtlResult<()> {
    let content = std::fs::read_to_string(path).map_err(|e| EtlError::SourceIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let parse_error = |e: serde_json::Error| EtlError::SourceParse {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    if content.trim_start().starts_with('[') {
        let rows: Vec<T> = serde_json::from_str(&content).map_err(parse_error)?;
        out.extend(rows);
        return Ok(());
    }

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        out.push(serde_json::from_str(line).map_err(parse_error)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_core::records::CatalogRecord;
    use tempfile::TempDir;

    const RECORD: &str = r#"{"song_id": "SO1", "title": "Intro", "artist_id": "AR1", "year": 0, "duration": 52.0, "artist_name": "A", "artist_location": "", "artist_latitude": null, "artist_longitude": null}"#;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_read_ndjson_across_nested_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "song_data/A/A/A/one.json", RECORD);
        write(
            dir.path(),
            "song_data/A/B/C/two.json",
            &format!("{RECORD}\n{RECORD}\n"),
        );

        let records: Vec<CatalogRecord> =
            read_records(dir.path(), "song_data/*/*/*/*.json").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].song_id, "SO1");
    }

    #[test]
    fn test_read_json_array_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "data/all.json", &format!("[{RECORD},{RECORD}]"));

        let records: Vec<CatalogRecord> = read_records(dir.path(), "data/*.json").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "data/one.json", &format!("\n{RECORD}\n\n"));

        let records: Vec<CatalogRecord> = read_records(dir.path(), "data/*.json").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_malformed_record_fails_run() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "data/bad.json",
            &format!("{RECORD}\n{{\"song_id\": 7}}\n"),
        );

        let result: EtlResult<Vec<CatalogRecord>> = read_records(dir.path(), "data/*.json");
        assert!(matches!(result, Err(EtlError::SourceParse { .. })));
    }

    #[test]
    fn test_no_matches_fails() {
        let dir = TempDir::new().unwrap();
        let result: EtlResult<Vec<CatalogRecord>> = read_records(dir.path(), "missing/*.json");
        assert!(matches!(result, Err(EtlError::EmptyInput { .. })));
    }

    #[test]
    fn test_discover_is_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "data/b.json", RECORD);
        write(dir.path(), "data/a.json", RECORD);

        let files = discover(dir.path(), "data/*.json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }
}
