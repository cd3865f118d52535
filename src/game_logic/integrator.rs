use crate::game_logic::{
    apply_drag, Car, CarProfile, CollisionFrame, Contact, Kinematics, KinematicState,
    PreviousPosition, RaceStats, ThrottleIdle, CAR_HIT_DAMPING, OBSTACLE_HIT_DAMPING,
};
use bevy::prelude::*;

/// Fired every tick for every car that ran an integration step.
#[derive(Event, Debug, Clone, Copy)]
pub struct CarDriving {
    pub car: Entity,
}

/// Fired when a car exhausts its off-track tolerance. Whoever owns the
/// checkpoint positions reacts after integration finishes.
#[derive(Event, Debug, Clone, Copy)]
pub struct CarReset {
    pub car: Entity,
}

/// Outcome of one car's integration step, in screen-space (y-down)
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    pub delta: Vec2,
    pub reset: bool,
}

/// One car's per-tick state advance: drag, velocity from heading,
/// collision response, off-track bookkeeping and the tolerance check.
/// Pure over plain data so the same code backs the system and the tests.
///
/// The displacement is computed from the pre-collision speed (damping
/// takes hold next frame), and the frame that trips the tolerance
/// produces no movement at all. Rotation is never touched by collisions.
pub fn integrate_step(
    state: &mut KinematicState,
    profile: &CarProfile,
    throttle_idle: bool,
    contacts: &[Contact],
    dt: f32,
) -> StepResult {
    if throttle_idle {
        apply_drag(state, profile.drag);
    }

    let rad = state.rotation.to_radians();
    let delta = Vec2::new(
        state.speed * rad.sin() * dt,
        -state.speed * rad.cos() * dt,
    );

    if contacts.is_empty() {
        if state.off_track > 0 {
            state.off_track -= 1;
        }
    } else {
        for contact in contacts {
            match contact {
                Contact::Car(_) => state.speed *= CAR_HIT_DAMPING,
                Contact::Obstacle(_) => {
                    state.off_track += 1;
                    state.speed *= OBSTACLE_HIT_DAMPING;
                }
            }
        }
    }

    // evaluated on the post-collision count, strictly after damping
    if state.off_track > profile.tolerance {
        state.off_track = 0;
        state.speed = 0.0;
        return StepResult {
            delta: Vec2::ZERO,
            reset: true,
        };
    }

    StepResult { delta, reset: false }
}

/// Advance every car from this frame's collision snapshot. The detector
/// has already finished for all cars; each car only ever mutates itself.
pub fn integrate_motion(
    time: Res<Time>,
    frame: Res<CollisionFrame>,
    mut cars: Query<
        (
            Entity,
            &CarProfile,
            &mut Kinematics,
            &mut Transform,
            &mut PreviousPosition,
            &mut RaceStats,
            &ThrottleIdle,
        ),
        With<Car>,
    >,
    mut driving_events: EventWriter<CarDriving>,
    mut reset_events: EventWriter<CarReset>,
) {
    let dt = time.delta_secs();

    for (entity, profile, mut kinematics, mut transform, mut previous, mut stats, idle) in
        cars.iter_mut()
    {
        driving_events.write(CarDriving { car: entity });
        kinematics.capture_previous();

        let result = integrate_step(
            &mut kinematics.current,
            profile,
            idle.0,
            frame.of(entity),
            dt,
        );

        debug_assert!(
            kinematics.current.speed >= profile.min_speed()
                && kinematics.current.speed <= profile.max_speed
        );

        if result.reset {
            stats.penalties += 1;
            reset_events.write(CarReset { car: entity });
            continue;
        }

        previous.0 = transform.translation.truncate();
        // step deltas are screen-space (y-down), the world is y-up
        transform.translation.x += result.delta.x;
        transform.translation.y -= result.delta.y;
    }
}
