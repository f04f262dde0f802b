//! `consent.yaml` configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "consent.yaml";
/// Default SQLite database location.
pub const DEFAULT_DB_PATH: &str = ".consent/consent.db";
/// Longest text that fits a utf8mb4 index prefix of 767 bytes.
pub const DEFAULT_MAX_KEY_LEN: usize = 191;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConsentConfig {
    pub storage: StorageConfig,
    pub keys: KeyConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file for the sqlite backend. Ignored by `memory`.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct KeyConfig {
    /// Maximum length, in characters, of a sanitized key.
    pub max_len: usize,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_KEY_LEN,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `warn` or `consent_core=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl ConsentConfig {
    pub fn from_yaml(path: &Path, s: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load an explicit config file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(path, &s)
    }

    /// Load `path` if given, otherwise [`DEFAULT_CONFIG_FILE`] when present,
    /// otherwise defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = ConsentConfig::from_yaml(Path::new("inline"), "{}").unwrap();
        assert_eq!(cfg, ConsentConfig::default());
        assert_eq!(cfg.storage.backend, StorageBackend::Sqlite);
        assert_eq!(cfg.storage.path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(cfg.keys.max_len, 191);
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.format, LogFormat::Text);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r#"
storage:
  backend: memory
logging:
  format: json
"#;
        let cfg = ConsentConfig::from_yaml(Path::new("inline"), yaml).unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.storage.path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ConsentConfig::from_yaml(Path::new("bad.yaml"), "storage:\n  engine: pg\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn load_reads_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "storage:\n  path: /tmp/x.db\nkeys:\n  max_len: 64").unwrap();

        let cfg = ConsentConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg.storage.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.keys.max_len, 64);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConsentConfig::discover(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
