//! `$TRUETRACK_HOME/config.toml`
//!
//! Every key is optional. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use truetrack_scan::FacingMode;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub scan: ScanSettings,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSettings {
    pub facing: FacingMode,
    pub frame_interval_ms: u64,
    pub frames_before_decode: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            frame_interval_ms: 150,
            frames_before_decode: 3,
        }
    }
}

impl ScanSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Simulated camera behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSettings {
    pub deny_permission: bool,
}

/// Path of the config file under the TrueTrack home.
pub fn config_path() -> PathBuf {
    truetrack_logging::truetrack_home().join(CONFIG_FILE)
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.scan.frame_interval(), Duration::from_millis(150));
        assert_eq!(settings.scan.frames_before_decode, 3);
        assert!(!settings.camera.deny_permission);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[scan]\nfacing = \"user\"\n\n[camera]\ndeny_permission = true\n")
            .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.scan.facing, FacingMode::User);
        assert_eq!(settings.scan.frame_interval_ms, 150);
        assert!(settings.camera.deny_permission);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[scan]\nframe_interval_ms = \"fast\"\n").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), path.as_path());
        assert!(err.to_string().contains(CONFIG_FILE));
    }
}
