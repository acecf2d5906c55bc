//! Persisted user settings at ~/.nightwatch/settings.json.
//!
//! Holds the selected city, the calculation parameters and an optional dataset
//! location. Missing or unreadable files load as defaults; missing fields
//! default individually so older files keep working.

use crate::gazetteer::CityRecord;
use crate::prayer::CalculationParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The city picked on the map, with the country it was picked from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub country: String,
    pub city: CityRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub location: Option<SavedLocation>,
    #[serde(default)]
    pub params: CalculationParams,
    /// Path or URL of the world-cities CSV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

#[derive(Debug)]
pub enum SettingsError {
    Io(String),
    Parse(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "Settings I/O error: {}", msg),
            Self::Parse(msg) => write!(f, "Settings format error: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

/// The settings file and its current contents.
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Load from the default location.
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from a specific path.
    pub fn load_from(path: PathBuf) -> Self {
        let settings = match Self::read_file(&path) {
            Ok(Some(s)) => s,
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
                Settings::default()
            }
        };
        Self { path, settings }
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nightwatch")
            .join("settings.json")
    }

    fn read_file(path: &Path) -> Result<Option<Settings>, SettingsError> {
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SettingsError::Io(e.to_string())),
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| SettingsError::Parse(e.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings and persist them.
    pub fn set(&mut self, settings: Settings) -> Result<(), SettingsError> {
        self.settings = settings;
        self.persist()
    }

    pub fn set_location(&mut self, location: SavedLocation) -> Result<(), SettingsError> {
        self.settings.location = Some(location);
        self.persist()
    }

    pub fn set_params(&mut self, params: CalculationParams) -> Result<(), SettingsError> {
        self.settings.params = params;
        self.persist()
    }

    fn persist(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| SettingsError::Parse(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| SettingsError::Io(e.to_string()))
    }
}
