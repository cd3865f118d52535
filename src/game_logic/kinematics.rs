use crate::game_logic::CarProfile;
use bevy::prelude::*;

/// One frame's worth of a car's motion state. Plain value so the
/// integrator can snapshot it by copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicState {
    /// signed scalar speed, positive = forward
    pub speed: f32,
    /// heading in degrees, clockwise from "up" = 0, kept in [0, 360)
    pub rotation: f32,
    /// consecutive off-track collision counter
    pub off_track: u32,
}

impl KinematicState {
    pub fn at_rest(rotation: f32) -> Self {
        Self {
            speed: 0.0,
            rotation: normalize_rotation(rotation),
            off_track: 0,
        }
    }
}

/// Double-buffered kinematic state: `previous` is copy-assigned from
/// `current` at the top of every integration tick and never mutated after
/// capture.
#[derive(Component, Clone, Debug)]
pub struct Kinematics {
    pub current: KinematicState,
    pub previous: KinematicState,
}

impl Kinematics {
    pub fn new(rotation: f32) -> Self {
        let state = KinematicState::at_rest(rotation);
        Self {
            current: state,
            previous: state,
        }
    }

    pub fn capture_previous(&mut self) {
        self.previous = self.current;
    }
}

/// Clamp a candidate speed to the profile bounds: reverse is capped at
/// half the forward limit.
pub fn clamp_speed(speed: f32, profile: &CarProfile) -> f32 {
    speed.clamp(profile.min_speed(), profile.max_speed)
}

/// Wrap a heading into [0, 360).
pub fn normalize_rotation(degrees: f32) -> f32 {
    degrees.rem_euclid(360.0)
}

/// Passive decay toward zero. Drag never flips the sign: if it exceeds
/// the remaining speed, the car simply stops.
pub fn apply_drag(state: &mut KinematicState, drag: f32) {
    if state.speed == 0.0 {
        return;
    }
    if drag > state.speed.abs() {
        state.speed = 0.0;
    } else if state.speed > 0.0 {
        state.speed -= drag;
    } else {
        state.speed += drag;
    }
}
