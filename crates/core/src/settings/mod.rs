use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Namespaced file name for the one persisted value.
pub const SETTINGS_FILE_NAME: &str = "showcase.settings.json";
/// Fallback when nothing usable is on disk.
pub const DEFAULT_VOLUME: u8 = 30;

const SETTINGS_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredSettings {
    version: u32,
    volume: u8,
}

/// The single persisted setting: audio volume, stored as a versioned JSON
/// envelope so future fields can migrate cleanly.
#[derive(Debug, Clone)]
pub struct VolumeSettings {
    path: PathBuf,
}

impl VolumeSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restores the persisted volume. A missing file, unreadable JSON, a
    /// version mismatch, or an out-of-range value all fall back to
    /// [`DEFAULT_VOLUME`]; rehydration never fails.
    pub fn load(&self) -> u8 {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return DEFAULT_VOLUME;
        };
        match serde_json::from_str::<StoredSettings>(&raw) {
            Ok(stored) if stored.version == SETTINGS_VERSION && stored.volume <= 100 => {
                stored.volume
            }
            Ok(stored) => {
                tracing::warn!(
                    version = stored.version,
                    volume = stored.volume,
                    "ignoring unusable persisted settings"
                );
                DEFAULT_VOLUME
            }
            Err(error) => {
                tracing::warn!(%error, "persisted settings unreadable");
                DEFAULT_VOLUME
            }
        }
    }

    pub fn store(&self, volume: u8) -> Result<()> {
        let stored = StoredSettings {
            version: SETTINGS_VERSION,
            volume: volume.min(100),
        };
        let raw = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
