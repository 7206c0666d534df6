use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("width and height must be between {min} and {max} (got {width}x{height})")]
    BoardSize { width: u32, height: u32, min: u32, max: u32 },

    #[error("speed must be between {min} and {max} (got {speed})")]
    Speed { speed: u32, min: u32, max: u32 },

    #[error("could not read settings from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse settings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not write settings to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize settings")]
    Serialize(#[from] toml::ser::Error),
}
