//! Configuration types and parsing for noteflow.yml

use crate::error::{CoreError, CoreResult};
use crate::time::TimezoneMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main project configuration from noteflow.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Root directory holding the raw JSON sources
    pub input_root: String,

    /// Root directory the five tables are written under
    pub output_root: String,

    /// Glob for catalog files, relative to the input root
    #[serde(default = "default_catalog_glob")]
    pub catalog_glob: String,

    /// Glob for event-log files, relative to the input root
    #[serde(default = "default_events_glob")]
    pub events_glob: String,

    /// Zone used to decode event timestamps (local or utc)
    #[serde(default)]
    pub timezone: TimezoneMode,

    /// Attempts per table write before the run fails
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,

    /// Object-storage credentials; not needed for local roots
    #[serde(default)]
    pub storage: Option<StorageCredentials>,
}

/// Object-storage access key pair.
///
/// Read once at startup; object-store backends receive it at construction.
/// The local backend needs none. The secret never appears in Debug output
/// or logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

fn default_catalog_glob() -> String {
    "song_data/*/*/*/*.json".to_string()
}

fn default_events_glob() -> String {
    "log_data/*.json".to_string()
}

fn default_write_attempts() -> u32 {
    3
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for noteflow.yml or noteflow.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("noteflow.yml");
        let yaml_path = dir.join("noteflow.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.input_root.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "input_root cannot be empty".to_string(),
            });
        }

        if self.output_root.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "output_root cannot be empty".to_string(),
            });
        }

        if self.catalog_glob.is_empty() || self.events_glob.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "input globs cannot be empty".to_string(),
            });
        }

        if self.write_attempts == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "write_attempts must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Input root resolved against a project root. Absolute roots are kept
    /// as-is.
    pub fn input_root_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.input_root)
    }

    /// Output root resolved against a project root. Absolute roots are kept
    /// as-is.
    pub fn output_root_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output_root)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
