use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SettingsError;

pub const MIN_BOARD_SIZE: u32 = 10;
pub const MAX_BOARD_SIZE: u32 = 30;
pub const MIN_SPEED: u32 = 5;
pub const MAX_SPEED: u32 = 30;

const SETTINGS_DIR: &str = "grid_snake";
const SETTINGS_FILE: &str = "settings.toml";

/// Board size and ticks per second.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub width: u32,
    pub height: u32,
    pub speed: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings { width: 20, height: 20, speed: 10 }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let size_range = MIN_BOARD_SIZE..=MAX_BOARD_SIZE;
        if !size_range.contains(&self.width) || !size_range.contains(&self.height) {
            return Err(SettingsError::BoardSize {
                width: self.width,
                height: self.height,
                min: MIN_BOARD_SIZE,
                max: MAX_BOARD_SIZE,
            });
        }

        if !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(SettingsError::Speed { speed: self.speed, min: MIN_SPEED, max: MAX_SPEED });
        }

        Ok(())
    }

    pub fn with_overrides(self, width: Option<u32>, height: Option<u32>, speed: Option<u32>) -> Self {
        Settings {
            width: width.unwrap_or(self.width),
            height: height.unwrap_or(self.height),
            speed: speed.unwrap_or(self.speed),
        }
    }
}

/// Last used settings, kept in a TOML file between runs.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        SettingsStore { path }
    }

    /// `<config dir>/grid_snake/settings.toml`, if the platform has a config dir.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join(SETTINGS_DIR).join(SETTINGS_FILE)))
    }

    /// A missing file is not an error: there is simply nothing stored yet.
    pub fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SettingsError::Read { path: self.path.clone(), source }),
        };

        toml::from_str(&content)
            .map(Some)
            .map_err(|source| SettingsError::Parse { path: self.path.clone(), source })
    }

    /// Falls back to the defaults when nothing usable is stored.
    pub fn load_or_default(&self) -> Settings {
        match self.load() {
            Ok(Some(settings)) => {
                info!(path = %self.path.display(), "loaded settings");
                settings
            }
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!(error = %e, "ignoring stored settings");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let content = toml::to_string(settings)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write { path: self.path.clone(), source })?;
        }

        fs::write(&self.path, content).map_err(|source| SettingsError::Write { path: self.path.clone(), source })?;
        info!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}
