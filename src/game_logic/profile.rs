use bevy::prelude::*;
use serde::Deserialize;
use std::error::Error;
use std::fmt;

/// Tuning constants for one car type. Immutable once validated; every car
/// of the same type shares the same values.
#[derive(Component, Debug, Clone, PartialEq, Deserialize)]
pub struct CarProfile {
    pub name: String,
    /// upper bound on forward speed (reverse is capped at half of this)
    pub max_speed: f32,
    /// speed gained per control tick while accelerating
    pub acceleration: f32,
    /// speed lost per control tick while braking out of forward motion
    pub braking: f32,
    /// degrees turned per control tick, gated on non-zero speed
    pub handling: f32,
    /// passive speed decay per tick without throttle input
    pub drag: f32,
    /// consecutive off-track collisions allowed before a checkpoint reset
    pub tolerance: u32,
    /// sprite variants this car type can spawn with
    #[serde(default)]
    pub liveries: Vec<String>,
}

impl CarProfile {
    /// Check the profile invariants. A bad profile is a configuration
    /// error and gets rejected here rather than producing undefined
    /// clamping behavior later.
    pub fn validate(self) -> Result<Self, ProfileError> {
        if !(self.max_speed > 0.0) {
            return Err(ProfileError::NonPositiveMaxSpeed {
                profile: self.name,
                value: self.max_speed,
            });
        }
        for (field, value) in [
            ("acceleration", self.acceleration),
            ("braking", self.braking),
            ("handling", self.handling),
            ("drag", self.drag),
        ] {
            if !(value >= 0.0) {
                return Err(ProfileError::NegativeField {
                    profile: self.name,
                    field,
                    value,
                });
            }
        }
        Ok(self)
    }

    /// Lower speed bound: reversing is limited to half the forward cap.
    pub fn min_speed(&self) -> f32 {
        -self.max_speed / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    NonPositiveMaxSpeed { profile: String, value: f32 },
    NegativeField { profile: String, field: &'static str, value: f32 },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::NonPositiveMaxSpeed { profile, value } => {
                write!(f, "profile '{profile}': max_speed must be positive, got {value}")
            }
            ProfileError::NegativeField { profile, field, value } => {
                write!(f, "profile '{profile}': {field} must be non-negative, got {value}")
            }
        }
    }
}

impl Error for ProfileError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(max_speed: f32, drag: f32) -> CarProfile {
        CarProfile {
            name: "test".into(),
            max_speed,
            acceleration: 2.0,
            braking: 4.0,
            handling: 5.0,
            drag,
            tolerance: 30,
            liveries: Vec::new(),
        }
    }

    #[test]
    fn valid_profile_passes() {
        assert!(profile(200.0, 1.0).validate().is_ok());
    }

    #[test]
    fn zero_max_speed_rejected() {
        let err = profile(0.0, 1.0).validate().unwrap_err();
        assert!(matches!(err, ProfileError::NonPositiveMaxSpeed { .. }));
    }

    #[test]
    fn nan_max_speed_rejected() {
        assert!(profile(f32::NAN, 1.0).validate().is_err());
    }

    #[test]
    fn negative_field_rejected() {
        let err = profile(200.0, -0.5).validate().unwrap_err();
        assert!(matches!(err, ProfileError::NegativeField { field: "drag", .. }));
    }

    #[test]
    fn min_speed_is_half_reverse() {
        assert_eq!(profile(200.0, 1.0).min_speed(), -100.0);
    }
}
