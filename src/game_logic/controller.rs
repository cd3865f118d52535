use crate::game_logic::{
    clamp_speed, normalize_rotation, CarProfile, Kinematics, KinematicState, PlayerControlled,
    ThrottleIdle,
};
use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Per-player key bindings, direction -> key.
#[derive(Component, Clone)]
pub struct CarControls {
    up: KeyCode,
    down: KeyCode,
    left: KeyCode,
    right: KeyCode,
}

impl CarControls {
    pub fn wasd() -> Self {
        Self {
            up: KeyCode::KeyW,
            down: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
        }
    }

    pub fn arrows() -> Self {
        Self {
            up: KeyCode::ArrowUp,
            down: KeyCode::ArrowDown,
            left: KeyCode::ArrowLeft,
            right: KeyCode::ArrowRight,
        }
    }

    pub fn key(&self, direction: Direction) -> KeyCode {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }
}

/// Translate one directional input into a speed/rotation delta, clamped
/// to the profile limits.
pub fn apply_input(state: &mut KinematicState, profile: &CarProfile, direction: Direction) {
    match direction {
        Direction::Up => {
            state.speed = clamp_speed(state.speed + profile.acceleration, profile);
        }
        Direction::Down => {
            // braking only opposes forward motion; from a stop or while
            // reversing this is reverse throttle
            let delta = if state.speed > 0.0 {
                profile.braking
            } else {
                profile.acceleration
            };
            state.speed = clamp_speed(state.speed - delta, profile);
        }
        Direction::Left => {
            if state.speed != 0.0 {
                state.rotation = normalize_rotation(state.rotation - profile.handling);
            }
        }
        Direction::Right => {
            if state.speed != 0.0 {
                state.rotation = normalize_rotation(state.rotation + profile.handling);
            }
        }
    }
}

/// Poll the keyboard for every player car and feed the pressed directions
/// through the controller. Runs first in the fixed-update chain so the
/// detector and integrator see this tick's inputs.
pub fn player_controls(
    input: Res<ButtonInput<KeyCode>>,
    mut players: Query<
        (&CarControls, &CarProfile, &mut Kinematics, &mut ThrottleIdle),
        With<PlayerControlled>,
    >,
) {
    for (controls, profile, mut kinematics, mut idle) in players.iter_mut() {
        let state = &mut kinematics.current;

        if input.pressed(controls.key(Direction::Up)) {
            apply_input(state, profile, Direction::Up);
            idle.0 = false;
        } else if input.pressed(controls.key(Direction::Down)) {
            apply_input(state, profile, Direction::Down);
            idle.0 = false;
        } else {
            idle.0 = true;
        }

        if input.pressed(controls.key(Direction::Left)) {
            apply_input(state, profile, Direction::Left);
        } else if input.pressed(controls.key(Direction::Right)) {
            apply_input(state, profile, Direction::Right);
        }
    }
}

/// Keep the sprite rotation locked to the authoritative heading so
/// rendering never lags the state by a frame. Headings are clockwise
/// from "up", bevy's z rotation is counter-clockwise.
pub fn sync_car_rotation(mut cars: Query<(&Kinematics, &mut Transform), With<crate::game_logic::Car>>) {
    for (kinematics, mut transform) in cars.iter_mut() {
        transform.rotation = Quat::from_rotation_z(-kinematics.current.rotation.to_radians());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CarProfile {
        CarProfile {
            name: "test".into(),
            max_speed: 200.0,
            acceleration: 3.0,
            braking: 5.0,
            handling: 4.0,
            drag: 1.0,
            tolerance: 30,
            liveries: Vec::new(),
        }
    }

    #[test]
    fn accelerating_respects_upper_bound() {
        let p = profile();
        let mut state = KinematicState::at_rest(0.0);
        state.speed = 199.0;
        apply_input(&mut state, &p, Direction::Up);
        assert_eq!(state.speed, 200.0);
        apply_input(&mut state, &p, Direction::Up);
        assert_eq!(state.speed, 200.0);
    }

    #[test]
    fn down_brakes_while_moving_forward() {
        let p = profile();
        let mut state = KinematicState::at_rest(0.0);
        state.speed = 20.0;
        apply_input(&mut state, &p, Direction::Down);
        assert_eq!(state.speed, 15.0); // braking, not acceleration
    }

    #[test]
    fn down_is_reverse_throttle_from_a_stop() {
        let p = profile();
        let mut state = KinematicState::at_rest(0.0);
        apply_input(&mut state, &p, Direction::Down);
        assert_eq!(state.speed, -3.0); // acceleration, not braking

        apply_input(&mut state, &p, Direction::Down);
        assert_eq!(state.speed, -6.0);
    }

    #[test]
    fn reverse_respects_lower_bound() {
        let p = profile();
        let mut state = KinematicState::at_rest(0.0);
        state.speed = -99.0;
        apply_input(&mut state, &p, Direction::Down);
        assert_eq!(state.speed, -100.0);
        apply_input(&mut state, &p, Direction::Down);
        assert_eq!(state.speed, -100.0);
    }

    #[test]
    fn steering_is_a_no_op_when_stationary() {
        let p = profile();
        let mut state = KinematicState::at_rest(45.0);
        apply_input(&mut state, &p, Direction::Left);
        apply_input(&mut state, &p, Direction::Right);
        assert_eq!(state.rotation, 45.0);
    }

    #[test]
    fn steering_turns_while_moving() {
        let p = profile();
        let mut state = KinematicState::at_rest(0.0);
        state.speed = 10.0;
        apply_input(&mut state, &p, Direction::Right);
        assert_eq!(state.rotation, 4.0);
        apply_input(&mut state, &p, Direction::Left);
        apply_input(&mut state, &p, Direction::Left);
        assert_eq!(state.rotation, 356.0);
    }

    #[test]
    fn rotation_stays_in_range_after_many_turns() {
        let p = profile();
        let mut state = KinematicState::at_rest(0.0);
        state.speed = 10.0;
        for _ in 0..500 {
            apply_input(&mut state, &p, Direction::Right);
            assert!((0.0..360.0).contains(&state.rotation));
        }
        for _ in 0..1000 {
            apply_input(&mut state, &p, Direction::Left);
            assert!((0.0..360.0).contains(&state.rotation));
        }
    }

    #[test]
    fn controls_map_directions_to_keys() {
        let wasd = CarControls::wasd();
        assert_eq!(wasd.key(Direction::Up), KeyCode::KeyW);
        let arrows = CarControls::arrows();
        assert_eq!(arrows.key(Direction::Down), KeyCode::ArrowDown);
    }
}
