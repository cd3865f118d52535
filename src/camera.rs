use crate::game_logic::{PlayerControlled, Track};
use bevy::prelude::*;

// Camera-related constants
pub const WIN_W: f32 = 1280.;
pub const WIN_H: f32 = 720.;

// Camera movement system that follows the lead player
pub fn move_camera(
    track: Res<Track>,
    players: Query<&Transform, With<PlayerControlled>>,
    mut camera: Single<&mut Transform, (With<Camera>, Without<PlayerControlled>)>,
) {
    let Some(player) = players.iter().next() else {
        return;
    };

    let max = Vec3::new(
        (track.width / 2. - WIN_W / 2.).max(0.),
        (track.height / 2. - WIN_H / 2.).max(0.),
        0.,
    );
    let min = -max;

    // clamp to track bounds
    let mut target = player.translation.clamp(min, max);

    // round to integers to prevent subpixel gaps
    target.x = target.x.round();
    target.y = target.y.round();
    target.z = camera.translation.z;

    camera.translation = target;
}

// Center the camera for the menu screens
pub fn reset_camera(mut camera: Single<&mut Transform, With<Camera>>) {
    camera.translation.x = 0.;
    camera.translation.y = 0.;
}
