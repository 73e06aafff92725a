// Configuration management for tunedeck
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::{config_dir, data_dir};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "tunedeck";
const CONFIG_ENV: &str = "TUNEDECK_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub playback: PlaybackConfig,
    pub library: LibraryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub ready_timeout_ms: u64,
    pub initial_volume: f32,
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LibraryConfig {
    pub scan_directories: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub filter: String,
}

fn app_data_dir() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: app_data_dir().join("library.json"),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 5000,
            initial_volume: 1.0,
            tick_interval_ms: 250,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: app_data_dir().join("logs"),
            filter: "info,tunedeck=debug".to_string(),
        }
    }
}

impl PlaybackConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(10))
    }

    /// Starting volume in [0, 1]; NaN falls back to full volume.
    pub fn volume(&self) -> f32 {
        if self.initial_volume.is_nan() {
            return 1.0;
        }
        self.initial_volume.clamp(0.0, 1.0)
    }
}

impl Config {
    /// Load from `TUNEDECK_CONFIG` or the default location, writing the
    /// defaults out on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tunedeck").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.playback.ready_timeout(), Duration::from_secs(5));

        let again = Config::load_from(&path).unwrap();
        assert_eq!(again.storage.snapshot_path, config.storage.snapshot_path);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[playback]\ninitial_volume = 3.0\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.playback.volume(), 1.0);
        assert_eq!(config.playback.ready_timeout_ms, 5000);
        assert!(config.library.scan_directories.is_empty());
    }

    #[test]
    fn nan_initial_volume_falls_back_to_full() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[playback]\ninitial_volume = nan\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.playback.initial_volume.is_nan());
        assert_eq!(config.playback.volume(), 1.0);

        let quiet = PlaybackConfig {
            initial_volume: -0.5,
            ..PlaybackConfig::default()
        };
        assert_eq!(quiet.volume(), 0.0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[playback\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
