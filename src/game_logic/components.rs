use bevy::prelude::*;

#[derive(Component)]
pub struct Car;

#[derive(Component)]
pub struct PlayerControlled;

/// Collidable static track geometry (obstacles, barriers). The drivable
/// road surface never carries this marker.
#[derive(Component)]
pub struct Obstacle;

#[derive(Component, Clone)]
pub struct CarName(pub String);

/// World position before the most recent committed move.
#[derive(Component, Clone, Copy)]
pub struct PreviousPosition(pub Vec2);

/// Set by the controller each control tick; when true the integrator
/// applies passive drag instead.
#[derive(Component, Default)]
pub struct ThrottleIdle(pub bool);

/// Read-only race bookkeeping for the UI/score layer.
#[derive(Component, Clone, Debug, Default)]
pub struct RaceStats {
    pub lap: u32,
    pub penalties: u32,
    pub score: i32,
    pub place: u32,
}
