use super::*;
use tempfile::TempDir;

const MINIMAL: &str = r#"
name: listening_lake
input_root: data/input
output_root: data/output
"#;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str(MINIMAL).unwrap();
    assert_eq!(config.name, "listening_lake");
    assert_eq!(config.catalog_glob, "song_data/*/*/*/*.json");
    assert_eq!(config.events_glob, "log_data/*.json");
    assert_eq!(config.timezone, TimezoneMode::Local);
    assert_eq!(config.write_attempts, 3);
    assert!(config.storage.is_none());

    let root = std::path::PathBuf::from("/tmp/project");
    assert_eq!(config.input_root_path(&root), root.join("data/input"));
    assert_eq!(config.output_root_path(&root), root.join("data/output"));
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: listening_lake
input_root: /srv/raw
output_root: /srv/lake
catalog_glob: "song_data/A/*/*/*.json"
events_glob: "log_data/2018-11-*.json"
timezone: utc
write_attempts: 5
storage:
  access_key_id: AKIAEXAMPLE
  secret_access_key: hunter2
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.timezone, TimezoneMode::Utc);
    assert_eq!(config.write_attempts, 5);
    assert_eq!(config.catalog_glob, "song_data/A/*/*/*.json");
    let creds = config.storage.as_ref().unwrap();
    assert_eq!(creds.access_key_id, "AKIAEXAMPLE");

    // Absolute roots are kept as-is regardless of the project root.
    let root = std::path::PathBuf::from("/elsewhere");
    assert_eq!(
        config.input_root_path(&root),
        std::path::PathBuf::from("/srv/raw")
    );
}

#[test]
fn test_unknown_field_rejected() {
    let yaml = format!("{MINIMAL}bogus_key: 1\n");
    let result: Result<Config, _> = serde_yaml::from_str(&yaml);
    assert!(result.is_err());
}

#[test]
fn test_load_validates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noteflow.yml");
    std::fs::write(&path, "name: \"\"\ninput_root: in\noutput_root: out\n").unwrap();

    let result = Config::load(&path);
    assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
}

#[test]
fn test_load_rejects_zero_attempts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noteflow.yml");
    std::fs::write(&path, format!("{MINIMAL}write_attempts: 0\n")).unwrap();

    let result = Config::load(&path);
    assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
}

#[test]
fn test_load_from_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("noteflow.yml"), MINIMAL).unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "listening_lake");
}

#[test]
fn test_load_from_dir_missing() {
    let dir = TempDir::new().unwrap();
    let result = Config::load_from_dir(dir.path());
    assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
}

#[test]
fn test_credentials_debug_redacts_secret() {
    let creds = StorageCredentials {
        access_key_id: "AKIAEXAMPLE".to_string(),
        secret_access_key: "hunter2".to_string(),
    };
    let rendered = format!("{creds:?}");
    assert!(rendered.contains("AKIAEXAMPLE"));
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("<redacted>"));
}
