use crate::game_logic::{CarProfile, ProfileError};
use bevy::prelude::*;
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;

/// Game-wide configuration. Passed in explicitly wherever it is needed,
/// never reached through ambient globals.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// enable mask tests between car pairs (off by default)
    pub car_collision: bool,
    /// scale applied to car sprites and their masks
    pub vehicle_scale: f32,
    pub total_laps: u32,
    pub track: String,
}

impl GameConfig {
    /// Reject settings the race cannot run with. A non-positive scale
    /// collapses every mask to a single pixel.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !self.vehicle_scale.is_finite() || self.vehicle_scale <= 0.0 {
            return Err(ConfigError::InvalidField("vehicle_scale"));
        }
        if self.total_laps == 0 {
            return Err(ConfigError::InvalidField("total_laps"));
        }
        Ok(self)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            car_collision: false,
            vehicle_scale: 1.0,
            total_laps: 3,
            track: "assets/tracks/speedway.json".into(),
        }
    }
}

/// The validated per-car-type profile table, loaded once at startup.
#[derive(Resource, Debug, Clone)]
pub struct ProfileTable {
    profiles: Vec<CarProfile>,
}

impl ProfileTable {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: Vec<CarProfile> = serde_json::from_str(json)?;
        if raw.is_empty() {
            return Err(ConfigError::EmptyProfileTable);
        }
        let profiles = raw
            .into_iter()
            .map(CarProfile::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { profiles })
    }

    /// Profile for the nth player, wrapping around the table.
    pub fn assign(&self, index: usize) -> &CarProfile {
        &self.profiles[index % self.profiles.len()]
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }
}

pub fn load_game_config(path: &str) -> Result<GameConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str::<GameConfig>(&text)?.validate()
}

pub fn load_profile_table(path: &str) -> Result<ProfileTable, ConfigError> {
    let text = fs::read_to_string(path)?;
    ProfileTable::from_json(&text)
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Profile(ProfileError),
    EmptyProfileTable,
    InvalidField(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config file: {e}"),
            ConfigError::Json(e) => write!(f, "failed to parse config: {e}"),
            ConfigError::Profile(e) => write!(f, "invalid car profile: {e}"),
            ConfigError::EmptyProfileTable => write!(f, "profile table is empty"),
            ConfigError::InvalidField(field) => write!(f, "config field {field} is out of range"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Profile(e) => Some(e),
            ConfigError::EmptyProfileTable | ConfigError::InvalidField(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<ProfileError> for ConfigError {
    fn from(e: ProfileError) -> Self {
        ConfigError::Profile(e)
    }
}
