use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the record database.
    pub data_directory: String,
    /// Root directory of the local object store.
    pub upload_directory: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Bound applied to each extraction capability call.
    #[serde(default = "default_extraction_timeout_secs")]
    pub extraction_timeout_secs: u64,
    /// Age after which a `pending` record is considered stuck and
    /// eligible for re-enqueueing.
    #[serde(default = "default_stale_pending_secs")]
    pub stale_pending_secs: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Disables ownership checks in the query service. Development and
    /// testing convenience only; must never be set in a deployed
    /// environment.
    #[serde(default)]
    pub auth_disabled: bool,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_extraction_timeout_secs() -> u64 {
    120
}

fn default_stale_pending_secs() -> u64 {
    900
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_directory: "./data".to_string(),
            upload_directory: "./uploads".to_string(),
            worker_count: default_worker_count(),
            extraction_timeout_secs: default_extraction_timeout_secs(),
            stale_pending_secs: default_stale_pending_secs(),
            queue_capacity: default_queue_capacity(),
            auth_disabled: false,
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.data_directory).join("pitchsense.db")
    }

    pub fn extraction_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.extraction_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.worker_count > 0);
        assert_eq!(config.extraction_timeout_secs, 120);
        assert_eq!(config.stale_pending_secs, 900);
        assert!(!config.auth_disabled);
    }

    #[test]
    fn test_minimal_json_applies_defaults() {
        let json = r#"{"data_directory": "/var/pitchsense", "upload_directory": "/var/uploads"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_directory, "/var/pitchsense");
        assert_eq!(config.queue_capacity, 64);
        assert!(!config.auth_disabled);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"data_directory": "d", "upload_directory": "u", "auth_disabled": true, "worker_count": 2}"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.auth_disabled);
        assert_eq!(config.worker_count, 2);
        assert!(config.database_path().ends_with("pitchsense.db"));
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/config.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_from_file_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let result = Config::from_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }
}
