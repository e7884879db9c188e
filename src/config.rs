//! Application configuration: where the database, image storage, and
//! exported archives live.
//!
//! Loaded from an optional `shutterbox.toml` in the data directory. A
//! missing file means defaults; a present-but-malformed file is an error
//! (silently ignoring a config the user wrote hides typos).
//!
//! ```toml
//! db_path = "shutterbox.db"
//! storage_dir = "storage"
//! exports_dir = "exports"
//! ```
//!
//! Relative paths are resolved against the data directory, so a config
//! file can be checked in alongside the data it describes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Name of the config file within the data directory.
const CONFIG_FILENAME: &str = "shutterbox.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database holding galleries, images, settings, and the
    /// export ledger.
    pub db_path: PathBuf,
    /// Root of the per-gallery image namespaces (`gallery_<id>/`).
    pub storage_dir: PathBuf,
    /// Where packaged export archives persist.
    pub exports_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("shutterbox.db"),
            storage_dir: PathBuf::from("storage"),
            exports_dir: PathBuf::from("exports"),
        }
    }
}

impl AppConfig {
    /// Load config from `<data_dir>/shutterbox.toml`, falling back to
    /// defaults when the file doesn't exist. All paths come back resolved
    /// against `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILENAME);
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?
        } else {
            Self::default()
        };
        config.db_path = resolve(data_dir, &config.db_path);
        config.storage_dir = resolve(data_dir, &config.storage_dir);
        config.exports_dir = resolve(data_dir, &config.exports_dir);
        Ok(config)
    }

    /// The storage namespace for one gallery's image files.
    pub fn gallery_dir(&self, gallery_id: i64) -> PathBuf {
        self.storage_dir.join(format!("gallery_{gallery_id}"))
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load(tmp.path()).unwrap();

        assert_eq!(config.db_path, tmp.path().join("shutterbox.db"));
        assert_eq!(config.storage_dir, tmp.path().join("storage"));
        assert_eq!(config.exports_dir, tmp.path().join("exports"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("shutterbox.toml"),
            "exports_dir = \"archives\"\n",
        )
        .unwrap();

        let config = AppConfig::load(tmp.path()).unwrap();
        assert_eq!(config.exports_dir, tmp.path().join("archives"));
        assert_eq!(config.db_path, tmp.path().join("shutterbox.db"));
    }

    #[test]
    fn absolute_paths_pass_through() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("shutterbox.toml"),
            "storage_dir = \"/var/lib/shutterbox/storage\"\n",
        )
        .unwrap();

        let config = AppConfig::load(tmp.path()).unwrap();
        assert_eq!(
            config.storage_dir,
            PathBuf::from("/var/lib/shutterbox/storage")
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("shutterbox.toml"), "db_path = [42]\n").unwrap();

        let result = AppConfig::load(tmp.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn gallery_dir_uses_id_namespace() {
        let config = AppConfig::default();
        assert_eq!(config.gallery_dir(7), PathBuf::from("storage/gallery_7"));
    }
}
